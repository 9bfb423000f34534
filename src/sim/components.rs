//! Body component traits
//!
//! Each trait groups the setters/getters for one physical concern. They are
//! implemented directly on [`Body`] so callers opt in with
//! `use arcade_physics::prelude::*`.

use glam::Vec2;

use super::body::{Body, Shape};
use crate::error::Result;

pub trait Velocity {
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, x: f32, y: f32) -> &mut Self;
    fn set_velocity_x(&mut self, x: f32) -> &mut Self;
    fn set_velocity_y(&mut self, y: f32) -> &mut Self;
    fn max_velocity(&self) -> Vec2;
    /// Per-axis clamp; negative values are taken as their magnitude
    fn set_max_velocity(&mut self, x: f32, y: f32) -> &mut Self;
    fn max_speed(&self) -> Option<f32>;
    /// Clamp on the velocity length; `None` disables it
    fn set_max_speed(&mut self, speed: Option<f32>) -> &mut Self;
}

impl Velocity for Body {
    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, x: f32, y: f32) -> &mut Self {
        self.velocity = Vec2::new(x, y);
        self.speed = self.velocity.length();
        self
    }

    fn set_velocity_x(&mut self, x: f32) -> &mut Self {
        self.set_velocity(x, self.velocity.y)
    }

    fn set_velocity_y(&mut self, y: f32) -> &mut Self {
        self.set_velocity(self.velocity.x, y)
    }

    fn max_velocity(&self) -> Vec2 {
        self.max_velocity
    }

    fn set_max_velocity(&mut self, x: f32, y: f32) -> &mut Self {
        self.max_velocity = Vec2::new(x.abs(), y.abs());
        self
    }

    fn max_speed(&self) -> Option<f32> {
        self.max_speed
    }

    fn set_max_speed(&mut self, speed: Option<f32>) -> &mut Self {
        self.max_speed = speed.map(f32::abs);
        self
    }
}

pub trait Acceleration {
    fn acceleration(&self) -> Vec2;
    fn set_acceleration(&mut self, x: f32, y: f32) -> &mut Self;
}

impl Acceleration for Body {
    fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    fn set_acceleration(&mut self, x: f32, y: f32) -> &mut Self {
        self.acceleration = Vec2::new(x, y);
        self
    }
}

pub trait Drag {
    fn drag(&self) -> Vec2;
    fn set_drag(&mut self, x: f32, y: f32) -> &mut Self;
    fn set_allow_drag(&mut self, allow: bool) -> &mut Self;
    /// Treat drag as a per-second velocity multiplier (0..1)
    fn set_damping(&mut self, damping: bool) -> &mut Self;
}

impl Drag for Body {
    fn drag(&self) -> Vec2 {
        self.drag
    }

    fn set_drag(&mut self, x: f32, y: f32) -> &mut Self {
        self.drag = Vec2::new(x.abs(), y.abs());
        self
    }

    fn set_allow_drag(&mut self, allow: bool) -> &mut Self {
        self.allow_drag = allow;
        self
    }

    fn set_damping(&mut self, damping: bool) -> &mut Self {
        self.use_damping = damping;
        self
    }
}

pub trait Bounce {
    fn bounce(&self) -> Vec2;
    /// Clamped to [0, 1]
    fn set_bounce(&mut self, x: f32, y: f32) -> &mut Self;
    /// Bounce used against world bounds; `None` falls back to `bounce`
    fn set_world_bounce(&mut self, bounce: Option<Vec2>) -> &mut Self;
    fn world_bounce(&self) -> Vec2;
}

impl Bounce for Body {
    fn bounce(&self) -> Vec2 {
        self.bounce
    }

    fn set_bounce(&mut self, x: f32, y: f32) -> &mut Self {
        self.bounce = clamp_unit(Vec2::new(x, y));
        self
    }

    fn set_world_bounce(&mut self, bounce: Option<Vec2>) -> &mut Self {
        self.world_bounce = bounce.map(clamp_unit);
        self
    }

    fn world_bounce(&self) -> Vec2 {
        self.world_bounce.unwrap_or(self.bounce)
    }
}

fn clamp_unit(v: Vec2) -> Vec2 {
    // NaN collapses to 0
    let c = |x: f32| if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    Vec2::new(c(v.x), c(v.y))
}

pub trait Gravity {
    fn gravity(&self) -> Vec2;
    /// Per-body gravity, added to the world's
    fn set_gravity(&mut self, x: f32, y: f32) -> &mut Self;
    fn set_gravity_scale(&mut self, scale: f32) -> &mut Self;
    fn set_allow_gravity(&mut self, allow: bool) -> &mut Self;
}

impl Gravity for Body {
    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, x: f32, y: f32) -> &mut Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    fn set_gravity_scale(&mut self, scale: f32) -> &mut Self {
        self.gravity_scale = scale;
        self
    }

    fn set_allow_gravity(&mut self, allow: bool) -> &mut Self {
        self.allow_gravity = allow;
        self
    }
}

pub trait Immovable {
    fn is_immovable(&self) -> bool;
    fn set_immovable(&mut self, immovable: bool) -> &mut Self;
}

impl Immovable for Body {
    fn is_immovable(&self) -> bool {
        self.immovable
    }

    fn set_immovable(&mut self, immovable: bool) -> &mut Self {
        self.immovable = immovable;
        self
    }
}

pub trait Friction {
    fn friction(&self) -> Vec2;
    fn set_friction(&mut self, x: f32, y: f32) -> &mut Self;
}

impl Friction for Body {
    fn friction(&self) -> Vec2 {
        self.friction
    }

    fn set_friction(&mut self, x: f32, y: f32) -> &mut Self {
        self.friction = Vec2::new(x, y);
        self
    }
}

pub trait Mass {
    fn mass(&self) -> f32;
    /// Non-positive or non-finite values are ignored
    fn set_mass(&mut self, mass: f32) -> &mut Self;
}

impl Mass for Body {
    fn mass(&self) -> f32 {
        self.mass
    }

    fn set_mass(&mut self, mass: f32) -> &mut Self {
        if mass.is_finite() && mass > 0.0 {
            self.mass = mass;
        } else {
            log::warn!("Ignoring invalid mass {mass}");
        }
        self
    }
}

pub trait Enable {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool) -> &mut Self;
}

impl Enable for Body {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        if !enabled {
            self.reset_flags(true);
            self.resting_steps = 0;
        }
        self
    }
}

pub trait Size {
    /// Resize the box, keeping the top-left corner
    fn set_size(&mut self, width: f32, height: f32) -> Result<&mut Self>;
    /// Turn into a circle of `radius`, keeping the centre
    fn set_circle(&mut self, radius: f32) -> Result<&mut Self>;
}

impl Size for Body {
    fn set_size(&mut self, width: f32, height: f32) -> Result<&mut Self> {
        self.set_dimensions(width, height, Shape::Box)?;
        Ok(self)
    }

    fn set_circle(&mut self, radius: f32) -> Result<&mut Self> {
        let center = self.center();
        let diameter = radius * 2.0;
        self.set_dimensions(diameter, diameter, Shape::Circle { radius })?;
        self.set_center(center);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Body {
        Body::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn test_bounce_is_clamped() {
        let mut b = body();
        b.set_bounce(1.5, -0.2);
        assert_eq!(b.bounce(), Vec2::new(1.0, 0.0));
        b.set_bounce(f32::NAN, 0.5);
        assert_eq!(b.bounce(), Vec2::new(0.0, 0.5));
    }

    #[test]
    fn test_world_bounce_fallback() {
        let mut b = body();
        b.set_bounce(0.3, 0.3);
        assert_eq!(b.world_bounce(), Vec2::splat(0.3));
        b.set_world_bounce(Some(Vec2::new(1.0, 0.8)));
        assert_eq!(b.world_bounce(), Vec2::new(1.0, 0.8));
    }

    #[test]
    fn test_chained_setters() {
        let mut b = body();
        b.set_velocity(3.0, 4.0).set_acceleration(1.0, 0.0).set_drag(-5.0, 2.0);
        assert_eq!(b.speed(), 5.0);
        assert_eq!(b.acceleration(), Vec2::new(1.0, 0.0));
        assert_eq!(b.drag(), Vec2::new(5.0, 2.0));
    }

    #[test]
    fn test_invalid_mass_ignored() {
        let mut b = body();
        b.set_mass(0.0).set_mass(-3.0).set_mass(f32::NAN);
        assert_eq!(b.mass(), 1.0);
        b.set_mass(4.0);
        assert_eq!(b.mass(), 4.0);
    }

    #[test]
    fn test_set_circle_keeps_centre() {
        let mut b = body();
        let centre = b.center();
        b.set_circle(8.0).unwrap();
        assert_eq!(b.center(), centre);
        assert_eq!(b.radius(), Some(8.0));
        assert!(b.set_circle(0.0).is_err());
        assert!(b.set_size(-1.0, 2.0).is_err());
    }

    #[test]
    fn test_disable_clears_flags() {
        let mut b = body();
        b.touching.left = true;
        b.set_enabled(false);
        assert!(!b.is_enabled());
        assert!(b.touching().none());
    }
}
