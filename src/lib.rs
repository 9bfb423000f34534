//! Arcade Physics - deterministic AABB/circle stepper for 2D games
//!
//! Core modules:
//! - `sim`: Bodies, broad phase, overlap tests, separation and the world step
//! - `config`: Data-driven world configuration (JSON)
//! - `error`: Error taxonomy for body creation, numeric faults and callbacks
//! - `platform`: Logging setup for native and browser builds

pub mod config;
pub mod error;
pub mod platform;
pub mod sim;

pub use config::{SeparationOrder, WorldConfig};
pub use error::{PhysicsError, Result};
pub use sim::{Body, BodyHandle, BodySet, Rect, Sides, StepReport, World};

/// Component traits and the types most callers need.
pub mod prelude {
    pub use crate::sim::components::{
        Acceleration, Bounce, Drag, Enable, Friction, Gravity, Immovable, Mass, Size, Velocity,
    };
    pub use crate::sim::{
        Body, BodyHandle, BodySet, CallbackResult, ColliderId, ColliderTarget, PhysicsEvent,
        Rect, Shape, Sides, StepReport, World,
    };
    pub use crate::{PhysicsError, WorldConfig};
}

/// Physics configuration defaults
pub mod consts {
    /// Default fixed step rate (60 Hz)
    pub const DEFAULT_FPS: u32 = 60;
    /// Maximum fixed substeps per `update` to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Extra overlap (world units) still attributed to an axis beyond the
    /// bodies' combined motion on that axis
    pub const OVERLAP_BIAS: f32 = 4.0;
    /// Penetration left uncorrected to absorb floating point noise
    pub const SEPARATION_SLOP: f32 = 0.01;

    /// Body defaults
    pub const DEFAULT_MAX_VELOCITY: f32 = 10_000.0;
    pub const DEFAULT_MASS: f32 = 1.0;
    /// Horizontal carry when riding a moving immovable body
    pub const DEFAULT_FRICTION_X: f32 = 1.0;

    /// Consecutive resting-overlap steps before a body counts as embedded
    pub const EMBEDDED_STEPS: u32 = 2;
    /// Relative speed below which an overlapping pair is considered at rest
    pub const REST_SPEED: f32 = 1.0;

    /// Linear drag snaps to zero inside this band
    pub const DRAG_EPSILON: f32 = 0.01;
    /// Damping drag snaps to zero below this speed
    pub const DAMPING_EPSILON: f32 = 0.001;

    /// Default world size
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;
}

/// `a > b` with tolerance
#[inline]
pub fn fuzzy_greater_than(a: f32, b: f32, epsilon: f32) -> bool {
    a > b - epsilon
}

/// `a < b` with tolerance
#[inline]
pub fn fuzzy_less_than(a: f32, b: f32, epsilon: f32) -> bool {
    a < b + epsilon
}

/// `|a - b| < epsilon`
#[inline]
pub fn fuzzy_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}
