//! Stat curves for player upgrades and enemy levels
//!
//! Every stat follows `initial + count * multiplier`, where `count` is the
//! enemy level or the number of upgrades the player bought. Cannons step
//! coarsely (`cannon_step` units of `count` per increment). All outputs are
//! clamped into the stat's valid range, so any input (negative, huge) yields a
//! usable value. Everything here is pure and deterministic.

use serde::{Deserialize, Serialize};

use crate::clamp_finite;

/// Which curve table to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
}

/// Scalable ship stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    MaxHp,
    Armor,
    RepairSpeed,
    Cannons,
    ReloadTime,
    Damage,
    Accuracy,
}

impl StatKind {
    pub const ALL: [StatKind; 7] = [
        StatKind::MaxHp,
        StatKind::Armor,
        StatKind::RepairSpeed,
        StatKind::Cannons,
        StatKind::ReloadTime,
        StatKind::Damage,
        StatKind::Accuracy,
    ];

    /// Key used in the flat progress record
    pub fn key(&self) -> &'static str {
        match self {
            StatKind::MaxHp => "maxHP",
            StatKind::Armor => "armor",
            StatKind::RepairSpeed => "repair",
            StatKind::Cannons => "cannons",
            StatKind::ReloadTime => "reload",
            StatKind::Damage => "damage",
            StatKind::Accuracy => "accuracy",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        StatKind::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Valid `[min, max]` range for this stat
    pub fn range(&self) -> (f32, f32) {
        match self {
            StatKind::MaxHp => (0.0, 1_000_000.0),
            StatKind::Armor => (0.0, 0.99),
            StatKind::RepairSpeed => (0.0, 50_000.0),
            StatKind::Cannons => (1.0, 5.0),
            StatKind::ReloadTime => (0.25, 30.0),
            StatKind::Damage => (0.0, 10_000.0),
            StatKind::Accuracy => (0.0, 100.0),
        }
    }

    /// Clamp a raw value into the stat's range (NaN maps to the minimum)
    pub fn clamp_value(&self, value: f32) -> f32 {
        let (min, max) = self.range();
        let value = clamp_finite(value, min, max);
        if *self == StatKind::Cannons {
            value.trunc()
        } else {
            value
        }
    }
}

/// One linear curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatCurve {
    pub initial: f32,
    pub multiplier: f32,
}

impl StatCurve {
    pub const fn new(initial: f32, multiplier: f32) -> Self {
        Self {
            initial,
            multiplier,
        }
    }
}

/// All curves for one entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveTable {
    pub max_hp: StatCurve,
    pub armor: StatCurve,
    pub repair_speed: StatCurve,
    pub cannons: StatCurve,
    pub reload_time: StatCurve,
    pub damage: StatCurve,
    pub accuracy: StatCurve,
    /// Units of `count` per cannon increment
    pub cannon_step: i32,
}

impl CurveTable {
    pub fn enemy() -> Self {
        Self {
            max_hp: StatCurve::new(50.0, 2.12),
            armor: StatCurve::new(0.0, 0.0043),
            repair_speed: StatCurve::new(0.0, 0.11),
            cannons: StatCurve::new(1.0, 1.0),
            reload_time: StatCurve::new(3.0, -0.01),
            damage: StatCurve::new(15.0, 1.09),
            accuracy: StatCurve::new(50.0, 0.43),
            cannon_step: 10,
        }
    }

    pub fn player() -> Self {
        Self {
            max_hp: StatCurve::new(50.0, 37.41),
            armor: StatCurve::new(0.0, 0.09),
            repair_speed: StatCurve::new(1.0, 8.1),
            cannons: StatCurve::new(1.0, 2.0),
            reload_time: StatCurve::new(2.0, -0.175),
            damage: StatCurve::new(25.0, 17.76),
            accuracy: StatCurve::new(60.0, 4.0),
            cannon_step: 1,
        }
    }

    pub fn curve(&self, stat: StatKind) -> StatCurve {
        match stat {
            StatKind::MaxHp => self.max_hp,
            StatKind::Armor => self.armor,
            StatKind::RepairSpeed => self.repair_speed,
            StatKind::Cannons => self.cannons,
            StatKind::ReloadTime => self.reload_time,
            StatKind::Damage => self.damage,
            StatKind::Accuracy => self.accuracy,
        }
    }
}

/// Curve tables for both entity kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCurves {
    pub player: CurveTable,
    pub enemy: CurveTable,
}

impl Default for StatCurves {
    fn default() -> Self {
        Self {
            player: CurveTable::player(),
            enemy: CurveTable::enemy(),
        }
    }
}

impl StatCurves {
    pub fn table(&self, kind: EntityKind) -> &CurveTable {
        match kind {
            EntityKind::Player => &self.player,
            EntityKind::Enemy => &self.enemy,
        }
    }

    /// Scaled and clamped value of `stat` for `count` levels/upgrades
    pub fn stat(&self, kind: EntityKind, stat: StatKind, count: i32) -> f32 {
        let table = self.table(kind);
        let curve = table.curve(stat);
        let steps = if stat == StatKind::Cannons {
            count.div_euclid(table.cannon_step.max(1)) as f32
        } else {
            count as f32
        };
        stat.clamp_value(curve.initial + steps * curve.multiplier)
    }
}

/// Collision damage dealt by ramming at `level`
pub fn impact_damage(level: i32) -> f32 {
    clamp_finite(30.0 * level as f32 * 0.5, 0.0, 1_000_000.0)
}

// ============================================================================
// Economy
// ============================================================================

/// Gold for completing a classic level (on top of bounties)
pub const BASE_GOLD_PER_LEVEL: u64 = 150;
/// Flat gold for replaying an already-cleared level
pub const REPLAY_GOLD: u64 = 50;
/// Base bounty for a sunk ship
pub const BASE_GOLD_PER_SHIP: f32 = 50.0;
/// Bounty growth per level
pub const SHIP_VALUE_MULTIPLIER: f32 = 10.3;

/// Gold awarded for sinking a ship at `level`
pub fn ship_bounty(level: i32) -> u64 {
    (BASE_GOLD_PER_SHIP + level.max(0) as f32 * SHIP_VALUE_MULTIPLIER) as u64
}

/// Gold awarded for clearing a classic level
///
/// A first clear pays the level reward plus the run's bounties; a replay pays
/// a flat amount.
pub fn level_completion_gold(level: i32, highest_level: i32, run_gold: u64) -> u64 {
    if level <= highest_level {
        REPLAY_GOLD
    } else {
        BASE_GOLD_PER_LEVEL + run_gold
    }
}

/// Base cost, cost growth and cap for an upgrade
pub fn upgrade_table(stat: StatKind) -> (u64, f32, u32) {
    match stat {
        StatKind::MaxHp => (450, 0.47, 10),
        StatKind::Armor => (750, 0.73, 10),
        StatKind::RepairSpeed => (475, 0.51, 10),
        StatKind::Cannons => (5000, 0.5, 2),
        StatKind::ReloadTime => (550, 0.55, 10),
        StatKind::Damage => (650, 0.52, 10),
        StatKind::Accuracy => (600, 0.61, 10),
    }
}

/// Most upgrades allowed for `stat`
pub fn upgrade_cap(stat: StatKind) -> u32 {
    upgrade_table(stat).2
}

/// Price of the next upgrade when `owned` are already bought
pub fn upgrade_cost(stat: StatKind, owned: u32) -> u64 {
    let (base, mult, _) = upgrade_table(stat);
    (base as f32 + base as f32 * mult * owned as f32) as u64
}
