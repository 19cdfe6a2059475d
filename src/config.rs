//! Gameplay tuning
//!
//! Stat curves and the handful of speeds, radii and timings the simulation
//! reads. Supplied once when a battle is built; `Default` carries the shipped
//! balance. Missing JSON fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::scaling::StatCurves;

/// Difficulty preset applied on top of the default curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Relaxed,
    #[default]
    Standard,
    Brutal,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Relaxed => "Relaxed",
            DifficultyPreset::Standard => "Standard",
            DifficultyPreset::Brutal => "Brutal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(DifficultyPreset::Relaxed),
            "standard" | "normal" => Some(DifficultyPreset::Standard),
            "brutal" | "hard" => Some(DifficultyPreset::Brutal),
            _ => None,
        }
    }

    /// Scale applied to enemy damage growth
    pub fn enemy_damage_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Relaxed => 0.75,
            DifficultyPreset::Standard => 1.0,
            DifficultyPreset::Brutal => 1.5,
        }
    }

    /// Engagement radius multiplier for enemy fire
    pub fn fire_range_scale(&self) -> f32 {
        match self {
            DifficultyPreset::Relaxed => 0.8,
            DifficultyPreset::Standard => 1.0,
            DifficultyPreset::Brutal => 1.2,
        }
    }
}

/// Simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub curves: StatCurves,

    // === Projectiles ===
    pub cannonball_speed: f32,
    /// Seconds before an unhit cannonball is retired
    pub flight_time: f32,

    // === Ships ===
    pub repair_grace: f32,
    pub enemy_fire_range: f32,
    pub enemy_fire_interval: f32,
    pub ship_speed: f32,
    pub knockback_time: f32,
    pub knockback_force: f32,

    // === Course ===
    pub map_speed: f32,
    pub distance_per_level: f32,
    /// Enemies outside this x window are off screen and do not update
    pub view_min_x: f32,
    pub view_max_x: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            curves: StatCurves::default(),

            cannonball_speed: CANNONBALL_SPEED,
            flight_time: FLIGHT_TIME_BOUND,

            repair_grace: REPAIR_GRACE,
            enemy_fire_range: ENEMY_FIRE_RANGE,
            enemy_fire_interval: ENEMY_FIRE_CHECK_INTERVAL,
            ship_speed: SHIP_SPEED,
            knockback_time: 0.5,
            knockback_force: 20.0,

            map_speed: MAP_SPEED,
            distance_per_level: DISTANCE_TO_INCREASE_LEVEL,
            view_min_x: VIEW_MIN_X,
            view_max_x: VIEW_MAX_X,
        }
    }
}

impl Tuning {
    /// Default tuning adjusted by a preset
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut tuning = Self::default();
        tuning.apply_preset(preset);
        tuning
    }

    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        self.curves.enemy.damage.multiplier *= preset.enemy_damage_scale();
        self.enemy_fire_range = ENEMY_FIRE_RANGE * preset.fire_range_scale();
    }

    /// Parse tuning from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("cannonball_speed", self.cannonball_speed),
            ("flight_time", self.flight_time),
            ("enemy_fire_interval", self.enemy_fire_interval),
            ("distance_per_level", self.distance_per_level),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        let non_negative = [
            ("repair_grace", self.repair_grace),
            ("enemy_fire_range", self.enemy_fire_range),
            ("ship_speed", self.ship_speed),
            ("knockback_time", self.knockback_time),
            ("knockback_force", self.knockback_force),
            ("map_speed", self.map_speed),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        if self.view_min_x >= self.view_max_x {
            return Err(ConfigError::InvalidValue {
                field: "view_min_x",
                value: self.view_min_x,
            });
        }
        Ok(())
    }

    /// Is `x` inside the visible window?
    pub fn in_view(&self, x: f32) -> bool {
        x >= self.view_min_x && x <= self.view_max_x
    }
}
