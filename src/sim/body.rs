//! Body state and shape
//!
//! A `Body` is plain data owned by the world's arena and referenced through a
//! generational [`BodyHandle`]. The integrator and resolver are the only code
//! that mutates it during a step; everything else goes through the component
//! traits in [`super::components`].

use glam::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use super::geom::{Facing, Rect, Sides};
use crate::consts::*;
use crate::error::{PhysicsError, Result};

new_key_type! {
    /// Stable, copyable reference to a body registered in a [`World`](super::World)
    pub struct BodyHandle;
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box filling the body bounds
    Box,
    /// Circle inscribed in the (square) body bounds
    Circle { radius: f32 },
}

/// A physics body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner of the bounds
    pub position: Vec2,
    /// Position at the start of the current step
    pub(crate) prev: Vec2,
    /// Position at the end of the last step (tracks external moves)
    pub(crate) settled: Vec2,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) shape: Shape,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Per-body gravity, added to world gravity
    pub gravity: Vec2,
    pub gravity_scale: f32,
    pub allow_gravity: bool,
    pub drag: Vec2,
    pub allow_drag: bool,
    /// Drag is a per-second multiplier instead of a linear deceleration
    pub use_damping: bool,
    pub(crate) bounce: Vec2,
    /// Bounce used against world bounds (falls back to `bounce`)
    pub(crate) world_bounce: Option<Vec2>,
    pub(crate) max_velocity: Vec2,
    pub(crate) max_speed: Option<f32>,
    pub(crate) mass: f32,
    /// Fraction of this body's own motion passed to bodies riding it (immovable only)
    pub friction: Vec2,
    pub(crate) immovable: bool,
    pub(crate) enabled: bool,

    pub collide_world_bounds: bool,
    /// Overrides the world bounds for this body
    pub custom_bounds: Option<Rect>,
    /// Collision category bits of this body
    pub category: u32,
    /// Categories this body collides with
    pub mask: u32,
    /// Sides that take part in collisions
    pub check_collision: Sides,

    pub(crate) touching: Sides,
    pub(crate) was_touching: Sides,
    pub(crate) blocked: Sides,
    pub(crate) embedded: bool,
    pub(crate) resting_steps: u32,
    pub(crate) resting_now: bool,
    /// Last resolved overlap per axis
    pub(crate) overlap: Vec2,
    pub(crate) delta: Vec2,
    pub(crate) speed: f32,
    pub(crate) facing: Facing,

    /// Emit `PhysicsEvent::Collide` for this body
    pub on_collide: bool,
    /// Emit `PhysicsEvent::Overlap` for this body
    pub on_overlap: bool,
    /// Emit `PhysicsEvent::WorldBounds` for this body
    pub on_world_bounds: bool,

    /// Registration index (assigned by the world, used for tie-breaks)
    pub(crate) registration: u64,
}

impl Body {
    /// Create a box body with its top-left corner at (x, y)
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self> {
        validate_size(width, height)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(PhysicsError::invalid_body("position must be finite", width, height));
        }
        Ok(Self::with_shape(Vec2::new(x, y), width, height, Shape::Box))
    }

    /// Create a circle body centred on (cx, cy)
    pub fn circle(cx: f32, cy: f32, radius: f32) -> Result<Self> {
        let diameter = radius * 2.0;
        validate_size(diameter, diameter)?;
        if !cx.is_finite() || !cy.is_finite() {
            return Err(PhysicsError::invalid_body("position must be finite", diameter, diameter));
        }
        let position = Vec2::new(cx - radius, cy - radius);
        Ok(Self::with_shape(position, diameter, diameter, Shape::Circle { radius }))
    }

    /// Create an immovable, gravity-free box
    pub fn fixed(x: f32, y: f32, width: f32, height: f32) -> Result<Self> {
        let mut body = Self::new(x, y, width, height)?;
        body.immovable = true;
        body.allow_gravity = false;
        Ok(body)
    }

    fn with_shape(position: Vec2, width: f32, height: f32, shape: Shape) -> Self {
        Self {
            position,
            prev: position,
            settled: position,
            width,
            height,
            shape,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            gravity: Vec2::ZERO,
            gravity_scale: 1.0,
            allow_gravity: true,
            drag: Vec2::ZERO,
            allow_drag: true,
            use_damping: false,
            bounce: Vec2::ZERO,
            world_bounce: None,
            max_velocity: Vec2::splat(DEFAULT_MAX_VELOCITY),
            max_speed: None,
            mass: DEFAULT_MASS,
            friction: Vec2::new(DEFAULT_FRICTION_X, 0.0),
            immovable: false,
            enabled: true,
            collide_world_bounds: false,
            custom_bounds: None,
            category: 1,
            mask: u32::MAX,
            check_collision: Sides::ALL,
            touching: Sides::NONE,
            was_touching: Sides::NONE,
            blocked: Sides::NONE,
            embedded: false,
            resting_steps: 0,
            resting_now: false,
            overlap: Vec2::ZERO,
            delta: Vec2::ZERO,
            speed: 0.0,
            facing: Facing::None,
            on_collide: false,
            on_overlap: false,
            on_world_bounds: false,
            registration: 0,
        }
    }

    /// Current AABB
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.half_size()
    }

    #[inline]
    pub fn half_size(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn is_circle(&self) -> bool {
        matches!(self.shape, Shape::Circle { .. })
    }

    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Circle { radius } => Some(radius),
            Shape::Box => None,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.position.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.height
    }

    /// Position at the start of the last step
    pub fn prev(&self) -> Vec2 {
        self.prev
    }

    /// Displacement over the last step
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    pub fn delta_abs(&self) -> Vec2 {
        self.delta.abs()
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn touching(&self) -> Sides {
        self.touching
    }

    pub fn was_touching(&self) -> Sides {
        self.was_touching
    }

    pub fn blocked(&self) -> Sides {
        self.blocked
    }

    pub fn embedded(&self) -> bool {
        self.embedded
    }

    /// Overlap resolved on each axis during the last step
    pub fn overlap(&self) -> Vec2 {
        self.overlap
    }

    pub fn registration(&self) -> u64 {
        self.registration
    }

    /// Resting on something below
    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }

    pub fn on_ceiling(&self) -> bool {
        self.blocked.up
    }

    pub fn on_wall(&self) -> bool {
        self.blocked.left || self.blocked.right
    }

    /// Category/mask filter (both directions must agree)
    pub fn can_collide(&self, other: &Body) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }

    /// Point inside the body's shape
    pub fn hit_test(&self, point: Vec2) -> bool {
        match self.shape {
            Shape::Box => self.bounds().contains_point(point),
            Shape::Circle { radius } => point.distance_squared(self.center()) <= radius * radius,
        }
    }

    /// Zero velocity and acceleration
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.speed = 0.0;
    }

    /// Teleport to (x, y) (top-left), stop, and clear contact history
    pub fn reset(&mut self, x: f32, y: f32) {
        self.stop();
        self.position = Vec2::new(x, y);
        self.prev = self.position;
        self.settled = self.position;
        self.delta = Vec2::ZERO;
        self.reset_flags(true);
        self.resting_steps = 0;
    }

    /// Move the centre to `center` without touching velocity
    pub fn set_center(&mut self, center: Vec2) {
        self.position = center - self.half_size();
    }

    /// True when position and velocity are finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Rotate touching into was_touching and clear per-step flags
    pub(crate) fn reset_flags(&mut self, clear_history: bool) {
        self.was_touching = if clear_history {
            Sides::NONE
        } else {
            self.touching
        };
        self.touching.clear();
        self.blocked.clear();
        self.overlap = Vec2::ZERO;
        self.embedded = false;
        self.resting_now = false;
    }

    /// Update the embedded heuristic at the end of a step
    pub(crate) fn settle(&mut self, embedded_steps: u32) {
        if self.resting_now {
            self.resting_steps = self.resting_steps.saturating_add(1);
        } else {
            self.resting_steps = 0;
        }
        self.embedded = self.resting_steps >= embedded_steps;
        self.settled = self.position;
    }

    /// Restore the last good state after a numeric fault
    pub(crate) fn quarantine(&mut self) {
        let fallback = if self.prev.is_finite() {
            self.prev
        } else {
            self.settled
        };
        self.position = if fallback.is_finite() {
            fallback
        } else {
            Vec2::ZERO
        };
        self.stop();
        self.delta = Vec2::ZERO;
        self.enabled = false;
        self.resting_now = false;
        self.resting_steps = 0;
        self.embedded = false;
    }

    pub(crate) fn set_dimensions(&mut self, width: f32, height: f32, shape: Shape) -> Result<()> {
        validate_size(width, height)?;
        self.width = width;
        self.height = height;
        self.shape = shape;
        Ok(())
    }
}

/// Width/height must be finite and positive
pub(crate) fn validate_size(width: f32, height: f32) -> Result<()> {
    if !width.is_finite() || !height.is_finite() {
        return Err(PhysicsError::invalid_body("size must be finite", width, height));
    }
    if width <= 0.0 || height <= 0.0 {
        return Err(PhysicsError::invalid_body("size must be positive", width, height));
    }
    Ok(())
}
