//! Battle state
//!
//! One [`Battle`] holds everything a running level needs: the ships (player
//! first), the course they sail on, run totals and the events produced since
//! the last drain.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::scheduler::UpdateScheduler;
use super::ship::CombatEntity;
use crate::config::Tuning;
use crate::hooks::Hooks;
use crate::map::{BankSide, ClassicLayout, EndlessMap, generate_classic_map};
use crate::progress::{ProgressRecord, Settlement};
use crate::scaling::level_completion_gold;

/// Level the endless mode starts at
pub const ENDLESS_START_LEVEL: i32 = 1;

/// Global gates the simulation reads but never writes (except `game_over`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFlags {
    pub started: bool,
    pub paused: bool,
    pub game_over: bool,
    /// Scroll the course toward the player
    pub move_map: bool,
    pub enemies_may_fire: bool,
    pub enemy_takes_damage: bool,
    pub player_takes_damage: bool,
}

impl GameFlags {
    /// Everything on: a normal running game
    pub fn playing() -> Self {
        Self {
            started: true,
            paused: false,
            game_over: false,
            move_map: true,
            enemies_may_fire: true,
            enemy_takes_damage: true,
            player_takes_damage: true,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.started && !self.paused && !self.game_over
    }
}

/// Value changes and milestones produced during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    HealthChanged { fraction: f32 },
    ReloadProgress { fraction: f32 },
    ShipCountChanged { count: u32 },
    EnemySunk { id: u32, rammed: bool },
    PlayerSunk { rammed: bool },
    LevelComplete { level: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Classic,
    Endless,
}

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    LevelComplete,
    PlayerSunk,
}

/// The course being sailed
#[derive(Debug, Clone)]
pub enum Course {
    Classic(ClassicLayout),
    Endless(EndlessMap),
}

/// Something the player's hull can be touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKey {
    Ship(u32),
    /// Classic obstacle index
    Obstacle(usize),
    /// Endless block, slot and block generation
    Slot { block: usize, slot: usize, generation: u32 },
    /// A river shore; adjoining river blocks form one continuous bank
    Bank(BankSide),
}

/// A running level
#[derive(Debug)]
pub struct Battle {
    pub flags: GameFlags,
    pub tuning: Tuning,
    /// Index 0 is the player
    pub ships: UpdateScheduler<CombatEntity>,
    pub course: Course,
    /// Gold earned from bounties this run
    pub run_gold: u64,
    /// Ships sunk this run
    pub run_score: u64,
    /// Remaining ships (classic) or ships sunk (endless)
    pub ship_count: u32,
    pub outcome: Option<Outcome>,
    pub time_ticks: u64,
    /// Highest classic level cleared before this run
    pub highest_level: i32,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) contacts: HashSet<ContactKey>,
    settled: bool,
}

impl Battle {
    /// Build a classic level from its seeded layout
    pub fn classic(level: i32, progress: &ProgressRecord, tuning: Tuning) -> Self {
        let layout = generate_classic_map(level);
        let mut ships = UpdateScheduler::new();
        ships.register(CombatEntity::player(
            0,
            progress.upgrades,
            layout.level(),
            &tuning,
            layout.level() as u64,
        ));
        for (i, spawn) in layout.enemies.iter().enumerate() {
            let id = i as u32 + 1;
            ships.register(CombatEntity::enemy(
                id,
                layout.level(),
                spawn.position,
                &tuning,
                ship_seed(layout.level() as u64, id),
            ));
        }
        let ship_count = layout.ships_spawned;
        log::info!("Classic battle at level {} with {} enemies", layout.level(), ship_count);
        Self::assemble(Course::Classic(layout), ships, ship_count, progress, tuning)
    }

    /// Build an endless run
    pub fn endless(seed: u64, progress: &ProgressRecord, tuning: Tuning) -> Self {
        let map = EndlessMap::with_distance_per_level(
            seed,
            ENDLESS_START_LEVEL,
            tuning.distance_per_level,
        );
        let mut ships = UpdateScheduler::new();
        ships.register(CombatEntity::player(0, progress.upgrades, map.level(), &tuning, seed));
        for (i, entry) in map.blocks().iter().enumerate() {
            let id = i as u32 + 1;
            let mut enemy = CombatEntity::enemy(
                id,
                map.level(),
                entry.enemy_position(),
                &tuning,
                ship_seed(seed, id),
            );
            enemy.enabled = entry.enemy_active;
            ships.register(enemy);
        }
        log::info!("Endless battle started (seed {})", seed);
        Self::assemble(Course::Endless(map), ships, 0, progress, tuning)
    }

    fn assemble(
        course: Course,
        ships: UpdateScheduler<CombatEntity>,
        ship_count: u32,
        progress: &ProgressRecord,
        tuning: Tuning,
    ) -> Self {
        Self {
            flags: GameFlags::playing(),
            tuning,
            ships,
            course,
            run_gold: 0,
            run_score: 0,
            ship_count,
            outcome: None,
            time_ticks: 0,
            highest_level: progress.highest_level,
            events: vec![GameEvent::ShipCountChanged { count: ship_count }],
            contacts: HashSet::new(),
            settled: false,
        }
    }

    pub fn mode(&self) -> GameMode {
        match self.course {
            Course::Classic(_) => GameMode::Classic,
            Course::Endless(_) => GameMode::Endless,
        }
    }

    /// Difficulty level currently in play
    pub fn level(&self) -> i32 {
        match &self.course {
            Course::Classic(layout) => layout.level(),
            Course::Endless(map) => map.level(),
        }
    }

    pub fn player(&self) -> Option<&CombatEntity> {
        self.ships.get(0).filter(|s| s.is_player())
    }

    pub fn player_mut(&mut self) -> Option<&mut CombatEntity> {
        self.ships.get_mut(0).filter(|s| s.is_player())
    }

    pub fn enemies(&self) -> impl Iterator<Item = &CombatEntity> {
        self.ships.iter().filter(|s| !s.is_player())
    }

    /// Solid obstacles in course coordinates
    pub fn obstacle_footprints(&self) -> Vec<(ContactKey, Aabb)> {
        match &self.course {
            Course::Classic(layout) => layout
                .obstacles
                .iter()
                .enumerate()
                .map(|(i, o)| (ContactKey::Obstacle(i), o.aabb()))
                .collect(),
            Course::Endless(map) => map
                .blocks()
                .iter()
                .enumerate()
                .flat_map(|(b, entry)| {
                    entry
                        .obstacles
                        .iter()
                        .enumerate()
                        .filter(|(_, slot)| slot.active)
                        .map(move |(s, slot)| {
                            (
                                ContactKey::Slot {
                                    block: b,
                                    slot: s,
                                    generation: entry.generation,
                                },
                                Aabb::new(
                                    entry.block.position + slot.offset,
                                    slot.kind.half_extents(),
                                ),
                            )
                        })
                })
                .collect(),
        }
    }

    /// River banks in course coordinates, classic only
    pub fn bank_footprints(&self) -> Vec<(ContactKey, Aabb)> {
        match &self.course {
            Course::Classic(layout) => layout
                .banks()
                .map(|(side, aabb)| (ContactKey::Bank(side), aabb))
                .collect(),
            Course::Endless(_) => Vec::new(),
        }
    }

    /// The goal island, classic only
    pub fn island(&self) -> Option<Aabb> {
        match &self.course {
            Course::Classic(layout) => Some(layout.island.aabb()),
            Course::Endless(_) => None,
        }
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// What this battle earned, once it has ended
    pub fn settlement(&self) -> Option<Settlement> {
        let outcome = self.outcome?;
        let settlement = match self.course {
            Course::Classic(ref layout) => {
                let cleared = outcome == Outcome::LevelComplete;
                Settlement {
                    gold: if cleared {
                        level_completion_gold(layout.level(), self.highest_level, self.run_gold)
                    } else {
                        0
                    },
                    score: 0,
                    ships_sunk: self.run_score,
                    cleared_level: cleared.then_some(layout.level()),
                }
            }
            Course::Endless(_) => Settlement {
                gold: self.run_gold,
                score: self.run_score,
                ships_sunk: self.run_score,
                cleared_level: None,
            },
        };
        Some(settlement)
    }

    /// Report the settlement to persistence, at most once
    pub fn settle(&mut self, hooks: &mut Hooks) -> Option<Settlement> {
        if self.settled {
            return None;
        }
        let settlement = self.settlement()?;
        self.settled = true;
        log::info!(
            "Battle settled: {} gold, {} ships sunk, outcome {:?}",
            settlement.gold,
            settlement.ships_sunk,
            self.outcome
        );
        hooks.settle(&settlement);
        Some(settlement)
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player().map(|p| p.position)
    }
}

fn ship_seed(base: u64, id: u32) -> u64 {
    base.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ id as u64
}
