//! World configuration
//!
//! Loaded from JSON; every field is optional and falls back to its default.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{PhysicsError, Result};
use crate::sim::{Rect, Sides};

/// Axis order for two-pass box separation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SeparationOrder {
    #[default]
    XThenY,
    YThenX,
    /// Y first when vertical gravity dominates, X first otherwise
    GravityDominant,
}

impl SeparationOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeparationOrder::XThenY => "XThenY",
            SeparationOrder::YThenX => "YThenX",
            SeparationOrder::GravityDominant => "GravityDominant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "xtheny" | "x" => Some(SeparationOrder::XThenY),
            "ythenx" | "y" => Some(SeparationOrder::YThenX),
            "gravitydominant" | "gravity" => Some(SeparationOrder::GravityDominant),
            _ => None,
        }
    }
}

/// World settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World gravity in units/s²
    pub gravity: Vec2,
    /// World bounds rectangle
    pub bounds: Rect,
    /// Which bounds edges stop bodies with `collide_world_bounds`
    pub bounds_collision: Sides,

    // === Resolver ===
    /// Extra overlap still attributed to an axis beyond the pair's motion
    pub overlap_bias: f32,
    /// Penetration left uncorrected
    pub separation_slop: f32,
    pub separation_order: SeparationOrder,
    /// Consecutive resting steps before a body is flagged embedded
    pub embedded_steps: u32,

    // === Broad phase ===
    /// Grid cell size; `None` derives it from body sizes each step
    pub cell_size: Option<f32>,
    /// Test every body pair, not just registered colliders
    pub collide_all: bool,

    // === Timing ===
    /// `update` advances in fixed `1/fps` steps (otherwise one variable step)
    pub fixed_step: bool,
    pub fps: u32,
    /// Multiplier on frame time fed to `update`
    pub time_scale: f32,
    /// Cap on fixed steps per `update`
    pub max_substeps: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            bounds: Rect::default(),
            bounds_collision: Sides::ALL,

            overlap_bias: OVERLAP_BIAS,
            separation_slop: SEPARATION_SLOP,
            separation_order: SeparationOrder::XThenY,
            embedded_steps: EMBEDDED_STEPS,

            cell_size: None,
            collide_all: true,

            fixed_step: true,
            fps: DEFAULT_FPS,
            time_scale: 1.0,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl WorldConfig {
    /// Default config with gravity
    pub fn with_gravity(x: f32, y: f32) -> Self {
        Self {
            gravity: Vec2::new(x, y),
            ..Self::default()
        }
    }

    /// Seconds per fixed step
    pub fn fixed_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Reject values the stepper cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::invalid_config("gravity must be finite"));
        }
        if !self.bounds.is_valid() {
            return Err(PhysicsError::invalid_config(
                "bounds must be finite with positive size",
            ));
        }
        if !self.overlap_bias.is_finite() || self.overlap_bias < 0.0 {
            return Err(PhysicsError::invalid_config("overlap_bias must be >= 0"));
        }
        if !self.separation_slop.is_finite() || self.separation_slop < 0.0 {
            return Err(PhysicsError::invalid_config("separation_slop must be >= 0"));
        }
        if let Some(size) = self.cell_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(PhysicsError::invalid_config("cell_size must be > 0"));
            }
        }
        if self.fps == 0 {
            return Err(PhysicsError::invalid_config("fps must be > 0"));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(PhysicsError::invalid_config("time_scale must be > 0"));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::invalid_config("max_substeps must be > 0"));
        }
        if self.embedded_steps == 0 {
            return Err(PhysicsError::invalid_config("embedded_steps must be > 0"));
        }
        Ok(())
    }
}
