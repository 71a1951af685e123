//! Error type for the fallible parts of the API.
//!
//! Geometric queries never fail: a miss is `None` or `false`. Errors are
//! reserved for invalid construction parameters and stale handles.

use crate::dynamics::EntityId;

/// Convenience alias used across the crate
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    #[error("direction cannot be normalized: {x}, {y}, {z}")]
    DegenerateDirection { x: f32, y: f32, z: f32 },

    #[error("invalid mass property {what}: {value}")]
    InvalidMass { what: &'static str, value: f32 },

    #[error("shape has no finite positive volume")]
    NoVolume,

    #[error("entity {0} is static and carries no mass")]
    NotSolid(EntityId),

    #[error("entity handle does not refer to a live entity")]
    EntityNotFound,
}

impl SimError {
    pub(crate) fn invalid_shape(reason: impl Into<String>) -> Self {
        SimError::InvalidShape {
            reason: reason.into(),
        }
    }
}
