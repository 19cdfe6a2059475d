//! Broadside - ship combat and sea-map simulation core
//!
//! Core modules:
//! - `scaling`: Stat curves for player upgrades and enemy levels
//! - `sim`: Deterministic combat simulation (ships, cannonballs, scheduler, tick)
//! - `map`: Seeded classic layouts and the endless terrain ring
//! - `hooks`: Collaborator seams (presentation, platform services, persistence)
//! - `progress`: Player progress record handed to/from persistence
//! - `config`: Data-driven tuning

pub mod config;
pub mod error;
pub mod hooks;
pub mod map;
pub mod progress;
pub mod scaling;
pub mod sim;

pub use config::Tuning;
pub use error::{ConfigError, EntityFault, ServiceError, UpgradeError};
pub use progress::{ProgressRecord, UpgradeLevels};

use glam::Vec2;

/// Game configuration constants
///
/// The course is a top-down plane: `x` runs along the course (the map scrolls
/// toward negative `x`), `y` runs across it.
pub mod consts {
    /// Fixed simulation timestep (one rendered frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Seconds a cannonball may fly before it is retired without a hit
    pub const FLIGHT_TIME_BOUND: f32 = 3.0;
    /// Cannonball travel speed (units/s)
    pub const CANNONBALL_SPEED: f32 = 50.0;
    /// Cannonball collision radius
    pub const CANNONBALL_RADIUS: f32 = 0.5;

    /// Grace period after a hit before repairs may resume
    pub const REPAIR_GRACE: f32 = 5.0;
    /// Enemy range check cadence
    pub const ENEMY_FIRE_CHECK_INTERVAL: f32 = 0.5;
    /// Enemies only fire at a player closer than this
    pub const ENEMY_FIRE_RANGE: f32 = 75.0;

    /// Map scroll speed toward the player (units/s)
    pub const MAP_SPEED: f32 = 15.0;
    /// Endless mode: distance travelled per difficulty level
    pub const DISTANCE_TO_INCREASE_LEVEL: f32 = 150.0;

    /// Player steering speed (units/s)
    pub const SHIP_SPEED: f32 = 10.0;
    /// Player play area
    pub const PLAYER_MIN_X: f32 = 0.0;
    pub const PLAYER_MAX_X: f32 = 20.0;
    pub const PLAYER_MIN_Y: f32 = -25.0;
    pub const PLAYER_MAX_Y: f32 = 25.0;
    /// Player spawn point
    pub const PLAYER_START_X: f32 = 10.0;
    pub const PLAYER_START_Y: f32 = 0.0;

    /// Ship bounding half-extents (length along x, beam along y)
    pub const SHIP_HALF_LENGTH: f32 = 7.0;
    pub const SHIP_HALF_BEAM: f32 = 3.0;
    /// Spacing between cannon mounts along the hull
    pub const MOUNT_SPACING: f32 = 2.5;

    /// Visible window for enemy activation (relative to the course origin)
    pub const VIEW_MIN_X: f32 = -60.0;
    pub const VIEW_MAX_X: f32 = 160.0;

    /// Highest classic level
    pub const MAX_LEVELS: i32 = 120;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for a bearing (radians, measured from +x toward +y)
#[inline]
pub fn heading_vector(bearing: f32) -> Vec2 {
    Vec2::new(bearing.cos(), bearing.sin())
}

/// Bearing of the vector from `from` to `to`
#[inline]
pub fn bearing_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Clamp that maps NaN to the lower bound
#[inline]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
