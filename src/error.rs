//! Error types for physics operations.

use thiserror::Error;

use crate::sim::BodyHandle;

/// Boxed error returned by user collision callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the physics core.
///
/// Only [`PhysicsError::InvalidBodyState`] is returned to the caller at
/// creation time; the rest are collected into a
/// [`StepReport`](crate::sim::StepReport) and never abort a step.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Zero, negative or non-finite body dimensions.
    #[error("invalid body state: {reason} (width {width}, height {height})")]
    InvalidBodyState {
        /// What was wrong with the shape.
        reason: String,
        /// Requested width (or diameter).
        width: f32,
        /// Requested height (or diameter).
        height: f32,
    },

    /// Position or velocity went NaN/infinite; the body was disabled.
    #[error("numeric instability on body {body:?} during {stage}")]
    NumericInstability {
        /// Offending body.
        body: BodyHandle,
        /// Pipeline stage that produced the value.
        stage: &'static str,
    },

    /// A collide/overlap callback returned an error.
    #[error("collision callback failed for {a:?} vs {b:?}: {source}")]
    Callback {
        /// First body of the pair.
        a: BodyHandle,
        /// Second body of the pair.
        b: BodyHandle,
        /// Error produced by the callback.
        #[source]
        source: CallbackError,
    },

    /// Handle does not refer to a live body.
    #[error("unknown body handle {0:?}")]
    UnknownBody(BodyHandle),

    /// Configuration value out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PhysicsError {
    /// Creates an invalid body state error.
    #[must_use]
    pub fn invalid_body(reason: impl Into<String>, width: f32, height: f32) -> Self {
        Self::InvalidBodyState {
            reason: reason.into(),
            width,
            height,
        }
    }

    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result alias for physics operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_body_display() {
        let err = PhysicsError::invalid_body("width must be positive", -2.0, 10.0);
        let msg = format!("{err}");
        assert!(msg.contains("width must be positive"));
        assert!(msg.contains("-2"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn callback_error_keeps_source() {
        use std::error::Error as _;

        let err = PhysicsError::Callback {
            a: BodyHandle::default(),
            b: BodyHandle::default(),
            source: "boom".into(),
        };
        assert!(format!("{err}").contains("boom"));
        assert!(err.source().is_some());
    }

    #[test]
    fn config_parse_from_serde() {
        let parse: std::result::Result<crate::WorldConfig, _> = serde_json::from_str("{ nope");
        let err: PhysicsError = parse.unwrap_err().into();
        assert!(matches!(err, PhysicsError::ConfigParse(_)));
    }
}
