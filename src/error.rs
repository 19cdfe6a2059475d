//! Error types
//!
//! None of these are fatal. Real-time paths (firing, placement, damage) never
//! produce errors for expected conditions; these cover entity faults that the
//! scheduler isolates, collaborator failures that the hooks layer swallows,
//! and configuration/record parsing at the edges.

use thiserror::Error;

use crate::scaling::StatKind;

/// A single entity's update failed; the scheduler logs it and moves on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityFault {
    /// The entity needs a reference (e.g. the player's position) that is not present
    #[error("entity {entity}: missing {what}")]
    MissingReference { entity: u32, what: &'static str },

    /// A state field went non-finite
    #[error("entity {entity}: non-finite {field}")]
    NonFinite { entity: u32, field: &'static str },
}

/// A platform-service collaborator call failed (network, auth, ...)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("service rejected request: {0}")]
    Rejected(String),
}

/// Tuning or record (de)serialization failed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

/// An upgrade purchase could not be made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("{stat:?} is already at its upgrade cap")]
    AtCap { stat: StatKind },

    #[error("upgrade costs {cost} gold but only {available} is available")]
    InsufficientGold { cost: u64, available: u64 },
}
