//! Deterministic physics simulation
//!
//! Everything the stepper touches lives here. Given the same bodies, config
//! and step sizes it produces the same results:
//! - Bodies are visited in registration order
//! - Candidate pairs are processed in ascending registration order
//! - Geometric ties are broken by registration index

pub mod body;
pub mod collider;
pub mod components;
pub mod geom;
pub mod grid;
pub mod integrate;
pub mod overlap;
pub mod resolve;
mod step;
pub mod world;

pub use body::{Body, BodyHandle, Shape};
pub use collider::{CallbackResult, CollideMode, Collider, ColliderId, ColliderTarget};
pub use geom::{Axis, Facing, Rect, Sides};
pub use grid::SpatialGrid;
pub use overlap::{ContactKind, Overlap};
pub use resolve::{ResolveParams, Resolution};
pub use world::{BodySet, Contact, PhysicsEvent, StepReport, World};
