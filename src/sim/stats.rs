//! Per-ship stat block
//!
//! Values arriving out of range are clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::clamp_finite;
use crate::consts::FLIGHT_TIME_BOUND;
use crate::progress::UpgradeLevels;
use crate::scaling::{EntityKind, StatCurves, StatKind, impact_damage};

/// Where a ship's stats come from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatSource {
    /// Player ship: upgrade counts, plus the level for impact damage
    Player { upgrades: UpgradeLevels, level: i32 },
    /// Enemy ship at a difficulty level (level 0 is the tutorial ship)
    Enemy { level: i32 },
}

/// Ship stats (value type)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub max_hit_points: f32,
    pub hit_points: f32,
    /// Fraction of incoming damage ignored, always < 1
    pub armor: f32,
    /// HP regained per second
    pub repair_speed: f32,
    pub number_of_cannons: u8,
    pub cannon_damage: f32,
    /// Seconds between volleys
    pub reload_time: f32,
    /// 0-100, 100 means no aiming jitter
    pub accuracy: f32,
    /// Damage dealt when this ship is part of a ramming collision
    pub impact_damage: f32,
}

impl Stats {
    /// Build a full-health stat block from a source
    pub fn from_source(source: StatSource, curves: &StatCurves) -> Self {
        match source {
            StatSource::Player { upgrades, level } => Self::for_player(&upgrades, level, curves),
            StatSource::Enemy { level } => Self::for_enemy(level, curves),
        }
    }

    /// Enemy stats for a difficulty level
    pub fn for_enemy(level: i32, curves: &StatCurves) -> Self {
        if level == 0 {
            return Self::tutorial_enemy();
        }
        let stat = |s| curves.stat(EntityKind::Enemy, s, level);
        let mut stats = Self::from_fn(stat, impact_damage(level));
        stats.clamp();
        stats
    }

    /// Player stats from upgrade counts
    pub fn for_player(upgrades: &UpgradeLevels, level: i32, curves: &StatCurves) -> Self {
        let stat = |s| {
            let count = i32::try_from(upgrades.get(s)).unwrap_or(i32::MAX);
            curves.stat(EntityKind::Player, s, count)
        };
        let mut stats = Self::from_fn(stat, impact_damage(level));
        stats.clamp();
        stats
    }

    /// The one-hit tutorial ship
    pub fn tutorial_enemy() -> Self {
        Self {
            max_hit_points: 1.0,
            hit_points: 1.0,
            armor: 0.0,
            repair_speed: 0.0,
            number_of_cannons: 1,
            cannon_damage: 1.0,
            reload_time: 3.0,
            accuracy: 50.0,
            impact_damage: 0.0,
        }
    }

    fn from_fn(stat: impl Fn(StatKind) -> f32, impact_damage: f32) -> Self {
        let max_hit_points = stat(StatKind::MaxHp);
        Self {
            max_hit_points,
            hit_points: max_hit_points,
            armor: stat(StatKind::Armor),
            repair_speed: stat(StatKind::RepairSpeed),
            number_of_cannons: stat(StatKind::Cannons) as u8,
            cannon_damage: stat(StatKind::Damage),
            reload_time: stat(StatKind::ReloadTime),
            accuracy: stat(StatKind::Accuracy),
            impact_damage,
        }
    }

    /// Force every field into its valid range
    pub fn clamp(&mut self) {
        self.number_of_cannons = self.number_of_cannons.clamp(1, 5);
        self.max_hit_points = StatKind::MaxHp.clamp_value(self.max_hit_points);
        self.hit_points = clamp_finite(self.hit_points, 0.0, self.max_hit_points);
        self.armor = StatKind::Armor.clamp_value(self.armor);
        self.repair_speed = StatKind::RepairSpeed.clamp_value(self.repair_speed);
        self.reload_time = StatKind::ReloadTime.clamp_value(self.reload_time);
        self.cannon_damage = StatKind::Damage.clamp_value(self.cannon_damage);
        self.accuracy = StatKind::Accuracy.clamp_value(self.accuracy);
        self.impact_damage = clamp_finite(self.impact_damage, 0.0, 1_000_000.0);
    }

    /// Damage left after armor mitigation
    #[inline]
    pub fn mitigate(&self, amount: f32) -> f32 {
        amount - amount * self.armor
    }

    /// Current HP as a fraction of max (0 for a hull with no max HP)
    pub fn health_fraction(&self) -> f32 {
        if self.max_hit_points > 0.0 {
            (self.hit_points / self.max_hit_points).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Projectiles needed to sustain continuous fire for one flight-time window
    pub fn pool_capacity(&self) -> usize {
        let volleys = (FLIGHT_TIME_BOUND / self.reload_time).ceil() as usize;
        volleys * self.number_of_cannons as usize
    }

    /// Largest aiming jitter in degrees
    pub fn max_jitter_degrees(&self) -> f32 {
        (100.0 - self.accuracy) / 5.0
    }
}
