//! Player progress record
//!
//! The flat key-value record the persistence collaborator owns: gold, upgrade
//! counts, best level and score. The simulation reads it once when a battle is
//! built and reports deltas back when the battle settles.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_LEVELS;
use crate::error::{ConfigError, UpgradeError};
use crate::hooks::Persistence;
use crate::scaling::{StatKind, upgrade_cap, upgrade_cost};

/// Purchased upgrade counts per stat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    #[serde(rename = "maxHP")]
    pub max_hp: u32,
    pub armor: u32,
    #[serde(rename = "repair")]
    pub repair_speed: u32,
    pub cannons: u32,
    #[serde(rename = "reload")]
    pub reload_time: u32,
    pub damage: u32,
    pub accuracy: u32,
}

impl UpgradeLevels {
    pub fn get(&self, stat: StatKind) -> u32 {
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

    /// Set a count, clamped to the stat's cap
    pub fn set(&mut self, stat: StatKind, count: u32) {
        let count = count.min(upgrade_cap(stat));
        match stat {
            StatKind::MaxHp => self.max_hp = count,
            StatKind::Armor => self.armor = count,
            StatKind::RepairSpeed => self.repair_speed = count,
            StatKind::Cannons => self.cannons = count,
            StatKind::ReloadTime => self.reload_time = count,
            StatKind::Damage => self.damage = count,
            StatKind::Accuracy => self.accuracy = count,
        }
    }

    /// Total upgrades bought
    pub fn total(&self) -> u32 {
        StatKind::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Persisted player progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    /// Spendable gold
    pub player_gold: u64,
    /// Gold earned over all runs
    pub lifetime_gold: u64,
    pub lifetime_ships_sunk: u64,
    /// Best endless score
    pub high_score: u64,
    /// Highest cleared classic level (-1 before the tutorial is cleared)
    pub highest_level: i32,
    pub upgrades: UpgradeLevels,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            player_gold: 0,
            lifetime_gold: 0,
            lifetime_ships_sunk: 0,
            high_score: 0,
            highest_level: -1,
            upgrades: UpgradeLevels::default(),
        }
    }
}

impl ProgressRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next classic level to play
    pub fn next_level(&self) -> i32 {
        (self.highest_level + 1).clamp(0, MAX_LEVELS)
    }

    /// Buy one upgrade of `stat`; returns the gold spent
    pub fn purchase_upgrade(&mut self, stat: StatKind) -> Result<u64, UpgradeError> {
        let owned = self.upgrades.get(stat);
        if owned >= upgrade_cap(stat) {
            return Err(UpgradeError::AtCap { stat });
        }
        let cost = upgrade_cost(stat, owned);
        if cost > self.player_gold {
            return Err(UpgradeError::InsufficientGold {
                cost,
                available: self.player_gold,
            });
        }
        self.player_gold -= cost;
        self.upgrades.set(stat, owned + 1);
        log::info!("Bought {:?} upgrade #{} for {} gold", stat, owned + 1, cost);
        Ok(cost)
    }

    /// Fold a finished battle into the record
    pub fn apply_settlement(&mut self, settlement: &Settlement) {
        self.player_gold = self.player_gold.saturating_add(settlement.gold);
        self.lifetime_gold = self.lifetime_gold.saturating_add(settlement.gold);
        self.lifetime_ships_sunk = self
            .lifetime_ships_sunk
            .saturating_add(settlement.ships_sunk);
        self.high_score = self.high_score.max(settlement.score);
        if let Some(level) = settlement.cleared_level {
            self.highest_level = self.highest_level.max(level);
        }
    }

    /// True when any field of `self` is smaller than the same field of `other`
    ///
    /// This is not an ordering: two records can each be behind the other.
    /// Prefer [`ProgressRecord::merge_max`] when reconciling copies.
    pub fn is_behind(&self, other: &ProgressRecord) -> bool {
        self.player_gold < other.player_gold
            || self.lifetime_gold < other.lifetime_gold
            || self.lifetime_ships_sunk < other.lifetime_ships_sunk
            || self.high_score < other.high_score
            || self.highest_level < other.highest_level
            || StatKind::ALL
                .iter()
                .any(|s| self.upgrades.get(*s) < other.upgrades.get(*s))
    }

    /// Field-wise maximum of two records
    pub fn merge_max(&self, other: &ProgressRecord) -> ProgressRecord {
        let mut upgrades = UpgradeLevels::default();
        for stat in StatKind::ALL {
            upgrades.set(stat, self.upgrades.get(stat).max(other.upgrades.get(stat)));
        }
        ProgressRecord {
            player_gold: self.player_gold.max(other.player_gold),
            lifetime_gold: self.lifetime_gold.max(other.lifetime_gold),
            lifetime_ships_sunk: self.lifetime_ships_sunk.max(other.lifetime_ships_sunk),
            high_score: self.high_score.max(other.high_score),
            highest_level: self.highest_level.max(other.highest_level),
            upgrades,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// What a finished battle earned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub gold: u64,
    pub score: u64,
    pub ships_sunk: u64,
    /// Classic level cleared by this battle, if any
    pub cleared_level: Option<i32>,
}

/// In-memory persistence collaborator
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub record: ProgressRecord,
    pub score_deltas: Vec<u64>,
    pub gold_deltas: Vec<u64>,
}

impl MemoryStore {
    pub fn new(record: ProgressRecord) -> Self {
        Self {
            record,
            ..Default::default()
        }
    }
}

impl Persistence for MemoryStore {
    fn progress(&self) -> ProgressRecord {
        self.record.clone()
    }

    fn record_score_delta(&mut self, score: u64) {
        self.score_deltas.push(score);
        self.record.high_score = self.record.high_score.max(score);
    }

    fn record_gold_delta(&mut self, gold: u64) {
        self.gold_deltas.push(gold);
        self.record.player_gold = self.record.player_gold.saturating_add(gold);
        self.record.lifetime_gold = self.record.lifetime_gold.saturating_add(gold);
    }

    fn record_settlement(&mut self, settlement: &Settlement) {
        // Gold and score already arrived as deltas
        self.record.lifetime_ships_sunk = self
            .record
            .lifetime_ships_sunk
            .saturating_add(settlement.ships_sunk);
        if let Some(level) = settlement.cleared_level {
            self.record.highest_level = self.record.highest_level.max(level);
        }
    }
}
