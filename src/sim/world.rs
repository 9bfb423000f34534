//! World container: body arena, colliders, configuration and events
//!
//! The stepping pipeline lives in [`super::step`].

use glam::Vec2;
use serde::Serialize;
use slotmap::SlotMap;

use super::body::{Body, BodyHandle, validate_size};
use super::collider::{CallbackResult, CollideMode, Collider, ColliderId, ColliderTarget, Colliders};
use super::geom::{Rect, Sides};
use super::grid::SpatialGrid;
use super::overlap;
use crate::config::WorldConfig;
use crate::error::{PhysicsError, Result};

/// Body arena with stable registration order
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: SlotMap<BodyHandle, Body>,
    /// Live handles, oldest first
    order: Vec<BodyHandle>,
    next_registration: u64,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(handle)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    /// Both bodies mutably; `None` if either is gone or `a == b`
    pub fn pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut Body, &mut Body)> {
        let [x, y] = self.bodies.get_disjoint_mut([a, b])?;
        Some((x, y))
    }

    /// Register a body, assigning the next registration index
    pub fn insert(&mut self, mut body: Body) -> BodyHandle {
        body.registration = self.next_registration;
        self.next_registration += 1;
        body.prev = body.position;
        body.settled = body.position;
        let handle = self.bodies.insert(body);
        self.order.push(handle);
        handle
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.remove(handle)?;
        self.order.retain(|h| *h != handle);
        Some(body)
    }

    /// Handles in registration order
    pub fn handles(&self) -> &[BodyHandle] {
        &self.order
    }

    /// Bodies in registration order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.order
            .iter()
            .filter_map(move |h| self.bodies.get(*h).map(|b| (*h, b)))
    }
}

/// Something a body opted into hearing about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhysicsEvent {
    Collide { a: BodyHandle, b: BodyHandle },
    Overlap { a: BodyHandle, b: BodyHandle },
    WorldBounds { body: BodyHandle, sides: Sides },
}

/// One resolved or detected contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub mode: CollideMode,
    /// Signed overlap resolved for `a`
    pub overlap: Vec2,
    /// A correction fell inside the separation slop and was skipped
    pub bias_applied: bool,
}

/// What happened during `step` / `update`
#[derive(Debug, Default)]
pub struct StepReport {
    /// Fixed steps taken (1 for a plain `step`)
    pub steps: u32,
    /// Pairs that reached the narrow phase
    pub pairs_tested: usize,
    pub collisions: usize,
    pub overlaps: usize,
    pub contacts: Vec<Contact>,
    /// Non-fatal faults: callback errors and quarantined bodies
    pub errors: Vec<PhysicsError>,
}

impl StepReport {
    /// No errors were reported
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: StepReport) {
        self.steps += other.steps;
        self.pairs_tested += other.pairs_tested;
        self.collisions += other.collisions;
        self.overlaps += other.overlaps;
        self.contacts.extend(other.contacts);
        self.errors.extend(other.errors);
    }
}

/// The physics world
#[derive(Debug)]
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) bodies: BodySet,
    pub(crate) grid: SpatialGrid,
    pub(crate) colliders: Colliders,
    pub(crate) events: Vec<PhysicsEvent>,
    /// Unconsumed time for fixed stepping
    pub(crate) accumulator: f32,
    pub(crate) paused: bool,
}

impl Default for World {
    fn default() -> Self {
        Self::with_config(WorldConfig::default())
    }
}

impl World {
    /// Create a world from a validated config
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: WorldConfig) -> Self {
        Self {
            grid: SpatialGrid::new(config.cell_size),
            config,
            bodies: BodySet::new(),
            colliders: Colliders::new(),
            events: Vec::new(),
            accumulator: 0.0,
            paused: false,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Replace the config (validated first)
    pub fn set_config(&mut self, config: WorldConfig) -> Result<()> {
        config.validate()?;
        self.grid = SpatialGrid::new(config.cell_size);
        self.config = config;
        Ok(())
    }

    // === Bodies ===

    /// Create a box body with its top-left corner at (x, y)
    pub fn create_body(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<BodyHandle> {
        self.add_body(Body::new(x, y, width, height)?)
    }

    /// Create a circle body centred on (cx, cy)
    pub fn create_circle(&mut self, cx: f32, cy: f32, radius: f32) -> Result<BodyHandle> {
        self.add_body(Body::circle(cx, cy, radius)?)
    }

    /// Create an immovable, gravity-free box
    pub fn create_static_body(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<BodyHandle> {
        self.add_body(Body::fixed(x, y, width, height)?)
    }

    /// Register a prepared body
    pub fn add_body(&mut self, body: Body) -> Result<BodyHandle> {
        validate_size(body.width, body.height)?;
        if !body.is_finite() {
            return Err(PhysicsError::invalid_body(
                "position and velocity must be finite",
                body.width,
                body.height,
            ));
        }
        let handle = self.bodies.insert(body);
        log::debug!("Added body {:?} ({} total)", handle, self.bodies.len());
        Ok(handle)
    }

    /// Unregister a body and hand it back
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<Body> {
        let body = self
            .bodies
            .remove(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        log::debug!("Destroyed body {:?} ({} left)", handle, self.bodies.len());
        Ok(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut BodySet {
        &mut self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // === World settings ===

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.config.gravity = Vec2::new(x, y);
    }

    pub fn bounds(&self) -> Rect {
        self.config.bounds
    }

    pub fn set_bounds(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<()> {
        let bounds = Rect::new(x, y, width, height);
        if !bounds.is_valid() {
            return Err(PhysicsError::invalid_config(
                "bounds must be finite with positive size",
            ));
        }
        self.config.bounds = bounds;
        Ok(())
    }

    /// Enable or disable collision per bounds edge
    pub fn set_bounds_collision(&mut self, left: bool, right: bool, up: bool, down: bool) {
        self.config.bounds_collision = Sides::new(left, right, up, down);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume stepping; time that passed while paused is discarded
    pub fn resume(&mut self) {
        self.paused = false;
        self.accumulator = 0.0;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // === Colliders ===

    /// Separate `a` from `b` when they meet, then call `callback`
    pub fn on_collide<F>(
        &mut self,
        a: impl Into<ColliderTarget>,
        b: impl Into<ColliderTarget>,
        callback: F,
    ) -> ColliderId
    where
        F: FnMut(&mut BodySet, BodyHandle, BodyHandle) -> CallbackResult + 'static,
    {
        self.add_collider(Collider::new(CollideMode::Collide, a, b).with_callback(callback))
    }

    /// Call `callback` while `a` and `b` overlap, without separating them
    pub fn on_overlap<F>(
        &mut self,
        a: impl Into<ColliderTarget>,
        b: impl Into<ColliderTarget>,
        callback: F,
    ) -> ColliderId
    where
        F: FnMut(&mut BodySet, BodyHandle, BodyHandle) -> CallbackResult + 'static,
    {
        self.add_collider(Collider::new(CollideMode::Overlap, a, b).with_callback(callback))
    }

    /// Register a fully configured collider (process filter etc.)
    pub fn add_collider(&mut self, collider: Collider) -> ColliderId {
        self.colliders.add(collider)
    }

    pub fn remove_collider(&mut self, id: ColliderId) -> bool {
        self.colliders.remove(id).is_some()
    }

    pub fn set_collider_active(&mut self, id: ColliderId, active: bool) -> bool {
        match self.colliders.get_mut(id) {
            Some(collider) => {
                collider.active = active;
                true
            }
            None => false,
        }
    }

    // === Queries ===

    /// Current shape overlap of two bodies (no resolution)
    pub fn overlaps(&self, a: BodyHandle, b: BodyHandle) -> Result<bool> {
        let body_a = self.bodies.get(a).ok_or(PhysicsError::UnknownBody(a))?;
        let body_b = self.bodies.get(b).ok_or(PhysicsError::UnknownBody(b))?;
        Ok(overlap::intersects(body_a, body_b))
    }

    /// Enabled bodies whose shape intersects `region`, in registration order
    pub fn query_region(&self, region: &Rect) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.enabled && body.bounds().intersects(region))
            .filter(|(_, body)| match body.radius() {
                Some(radius) => overlap::circle_vs_aabb(body.center(), radius, region, -1.0).overlapping,
                None => true,
            })
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Take the events queued by the last `step`/`update` call. Undrained
    /// events are dropped when the next one starts.
    pub fn drain_events(&mut self) -> impl Iterator<Item = PhysicsEvent> + '_ {
        self.events.drain(..)
    }

    /// Teleport a body that left the world bounds (plus `padding`) to the
    /// opposite edge. Returns whether it moved.
    pub fn wrap(&mut self, handle: BodyHandle, padding: f32) -> Result<bool> {
        let bounds = self.config.bounds.expanded(padding);
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;

        let mut wrapped = false;
        if body.right() < bounds.left() {
            body.position.x = bounds.right();
            wrapped = true;
        } else if body.left() > bounds.right() {
            body.position.x = bounds.left() - body.width;
            wrapped = true;
        }
        if body.bottom() < bounds.top() {
            body.position.y = bounds.bottom();
            wrapped = true;
        } else if body.top() > bounds.bottom() {
            body.position.y = bounds.top() - body.height;
            wrapped = true;
        }
        if wrapped {
            // Teleports are not motion
            body.prev = body.position;
            body.settled = body.position;
        }
        Ok(wrapped)
    }
}
