//! Combat entities
//!
//! Player and enemy ships share one struct. What differs (who picks targets,
//! how the hull moves) lives in [`Behavior`]. Every delay is a counter
//! advanced by tick time: reload, repair cooldown, enemy fire cadence and
//! knockback.
//!
//! ```text
//! Ready --shoot--> Reloading --reload_time elapsed--> Ready
//!   \                  |
//!    `--hp == 0 or rammed--> Sinking (terminal until reset_for_level)
//! ```

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cannonball::{Faction, ProjectilePool};
use super::collision::{Aabb, Impact, classify_impact};
use super::scheduler::Updatable;
use super::state::{GameEvent, GameFlags};
use super::stats::{StatSource, Stats};
use super::tick::TickInput;
use crate::config::Tuning;
use crate::consts::*;
use crate::error::EntityFault;
use crate::progress::UpgradeLevels;
use crate::{bearing_between, heading_vector, normalize_angle};

/// Player steering is this much faster than the base ship speed
const PLAYER_STEER_FACTOR: f32 = 1.5;
/// Relative slack on timer deadlines; summed tick times land a hair short
const TIMER_TOLERANCE: f32 = 1e-4;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShipState {
    Ready,
    Reloading { elapsed: f32 },
    Sinking { rammed: bool },
}

/// Active side-impact push
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub remaining: f32,
    /// Unit push direction
    pub direction: Vec2,
    pub force: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerControl {
    pub knockback: Option<Knockback>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyControl {
    /// Time since the last range check
    pub check_timer: f32,
}

/// What drives a ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Player(PlayerControl),
    Enemy(EnemyControl),
}

/// Cannon position relative to the hull center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannonMount {
    pub offset: Vec2,
}

/// Everything a ship may read or emit during its update
pub struct ShipContext<'a> {
    pub dt: f32,
    pub flags: &'a GameFlags,
    pub input: &'a TickInput,
    /// `None` when there is no player ship to target
    pub player_position: Option<Vec2>,
    pub tuning: &'a Tuning,
    pub events: &'a mut Vec<GameEvent>,
}

/// A player or enemy ship
#[derive(Debug, Clone)]
pub struct CombatEntity {
    pub id: u32,
    pub behavior: Behavior,
    pub stats: Stats,
    pub state: ShipState,
    pub position: Vec2,
    /// Disabled ships are neither updated nor hit (empty endless slots)
    pub enabled: bool,
    source: StatSource,
    mounts: Vec<CannonMount>,
    pool: ProjectilePool,
    repair_cooldown: f32,
    repair_grace: f32,
    rng: Pcg32,
}

impl CombatEntity {
    /// The player ship built from purchased upgrades
    pub fn player(
        id: u32,
        upgrades: UpgradeLevels,
        level: i32,
        tuning: &Tuning,
        seed: u64,
    ) -> Self {
        Self::build(
            id,
            Behavior::Player(PlayerControl::default()),
            StatSource::Player { upgrades, level },
            Vec2::new(PLAYER_START_X, PLAYER_START_Y),
            tuning,
            seed,
        )
    }

    /// An enemy ship at a difficulty level
    pub fn enemy(id: u32, level: i32, position: Vec2, tuning: &Tuning, seed: u64) -> Self {
        Self::build(
            id,
            Behavior::Enemy(EnemyControl::default()),
            StatSource::Enemy { level },
            position,
            tuning,
            seed,
        )
    }

    fn build(
        id: u32,
        behavior: Behavior,
        source: StatSource,
        position: Vec2,
        tuning: &Tuning,
        seed: u64,
    ) -> Self {
        let faction = match behavior {
            Behavior::Player(_) => Faction::Player,
            Behavior::Enemy(_) => Faction::Enemy,
        };
        let stats = Stats::from_source(source, &tuning.curves);
        let mut ship = Self {
            id,
            behavior,
            stats,
            state: ShipState::Ready,
            position,
            enabled: true,
            source,
            mounts: Vec::new(),
            pool: ProjectilePool::new(
                faction,
                stats.pool_capacity(),
                tuning.cannonball_speed,
                tuning.flight_time,
            ),
            repair_cooldown: 0.0,
            repair_grace: tuning.repair_grace,
            rng: Pcg32::seed_from_u64(seed),
        };
        ship.layout_mounts();
        ship
    }

    /// Re-derive stats from a source; calling twice with the same source is a no-op
    pub fn set_stats(&mut self, source: StatSource, tuning: &Tuning) {
        let stats = Stats::from_source(source, &tuning.curves);
        if self.source == source && self.stats == stats {
            return;
        }
        self.source = source;
        self.stats = stats;
        self.repair_grace = tuning.repair_grace;
        self.pool.grow_to(stats.pool_capacity());
        self.layout_mounts();
    }

    /// Recycle an enemy into a fresh ship for `level` at `position`
    pub fn reset_for_level(&mut self, level: i32, position: Vec2, tuning: &Tuning) {
        self.set_stats(StatSource::Enemy { level }, tuning);
        self.stats.hit_points = self.stats.max_hit_points;
        self.state = ShipState::Ready;
        self.position = position;
        self.enabled = true;
        self.repair_cooldown = 0.0;
        self.pool.recall_all();
        match &mut self.behavior {
            Behavior::Enemy(control) => control.check_timer = 0.0,
            Behavior::Player(control) => control.knockback = None,
        }
    }

    fn layout_mounts(&mut self) {
        let n = self.stats.number_of_cannons as usize;
        let center = (n as f32 - 1.0) / 2.0;
        self.mounts = (0..n)
            .map(|i| CannonMount {
                offset: Vec2::new((i as f32 - center) * MOUNT_SPACING, 0.0),
            })
            .collect();
    }

    pub fn source(&self) -> StatSource {
        self.source
    }

    pub fn mounts(&self) -> &[CannonMount] {
        &self.mounts
    }

    pub fn pool(&self) -> &ProjectilePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ProjectilePool {
        &mut self.pool
    }

    pub fn faction(&self) -> Faction {
        self.pool.faction()
    }

    pub fn is_player(&self) -> bool {
        matches!(self.behavior, Behavior::Player(_))
    }

    pub fn is_sinking(&self) -> bool {
        matches!(self.state, ShipState::Sinking { .. })
    }

    pub fn is_reloading(&self) -> bool {
        matches!(self.state, ShipState::Reloading { .. })
    }

    /// Can this ship be hit right now?
    pub fn is_targetable(&self) -> bool {
        self.enabled && !self.is_sinking()
    }

    pub fn repair_cooldown(&self) -> f32 {
        self.repair_cooldown
    }

    pub fn knockback(&self) -> Option<Knockback> {
        match &self.behavior {
            Behavior::Player(control) => control.knockback,
            Behavior::Enemy(_) => None,
        }
    }

    pub fn hull(&self) -> Aabb {
        Aabb::new(self.position, Vec2::new(SHIP_HALF_LENGTH, SHIP_HALF_BEAM))
    }

    /// Apply a hit. Returns true when the hit landed.
    pub fn take_damage(
        &mut self,
        amount: f32,
        rammed: bool,
        flags: &GameFlags,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if self.is_sinking() {
            return false;
        }
        let gate_open = if self.is_player() {
            flags.player_takes_damage
        } else {
            flags.enemy_takes_damage
        };
        if !gate_open {
            return false;
        }

        let effective = self.stats.mitigate(amount.max(0.0));
        self.stats.hit_points =
            crate::clamp_finite(self.stats.hit_points - effective, 0.0, self.stats.max_hit_points);
        self.repair_cooldown = self.repair_grace;

        if self.is_player() {
            events.push(GameEvent::HealthChanged {
                fraction: self.stats.health_fraction(),
            });
        }
        if self.stats.hit_points <= 0.0 {
            self.sink(rammed, events);
        }
        true
    }

    /// Enter the terminal state
    pub fn sink(&mut self, rammed: bool, events: &mut Vec<GameEvent>) {
        if self.is_sinking() {
            return;
        }
        self.state = ShipState::Sinking { rammed };
        match &mut self.behavior {
            Behavior::Player(control) => {
                control.knockback = None;
                log::info!("Player sunk (rammed: {})", rammed);
                events.push(GameEvent::PlayerSunk { rammed });
            }
            Behavior::Enemy(_) => {
                log::debug!("Enemy #{} sunk (rammed: {})", self.id, rammed);
                events.push(GameEvent::EnemySunk {
                    id: self.id,
                    rammed,
                });
            }
        }
    }

    /// Regain hit points once the post-hit cooldown has passed. Returns true
    /// when hit points changed.
    pub fn repair(&mut self, dt: f32) -> bool {
        if self.is_sinking()
            || self.stats.hit_points >= self.stats.max_hit_points
            || self.repair_cooldown > 0.0
            || self.stats.repair_speed <= 0.0
        {
            return false;
        }
        self.stats.hit_points =
            (self.stats.hit_points + self.stats.repair_speed * dt).min(self.stats.max_hit_points);
        true
    }

    /// Fire every mount at `target`. Returns the number of cannonballs launched.
    ///
    /// Nothing is fired while reloading, sinking, or when the pool holds fewer
    /// cannonballs than there are mounts.
    pub fn shoot(&mut self, target: Vec2) -> usize {
        if self.is_sinking() || self.is_reloading() {
            return 0;
        }
        if self.pool.available() < self.mounts.len() {
            log::debug!(
                "Ship #{} held fire: {} of {} cannonballs ready",
                self.id,
                self.pool.available(),
                self.mounts.len()
            );
            return 0;
        }

        let max_jitter = self.stats.max_jitter_degrees();
        let mut fired = 0;
        for mount in &self.mounts {
            let muzzle = self.position + mount.offset;
            let mut bearing = bearing_between(muzzle, target);
            if max_jitter > 0.0 {
                let magnitude: f32 = self.rng.random_range(0.0..max_jitter);
                let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
                bearing += (sign * magnitude).to_radians();
            }
            let heading = heading_vector(normalize_angle(bearing));
            if self
                .pool
                .fire(muzzle, heading, self.stats.cannon_damage)
                .is_some()
            {
                fired += 1;
            }
        }
        self.state = ShipState::Reloading { elapsed: 0.0 };
        fired
    }

    /// Reload fraction in [0, 1] (1 when ready)
    pub fn reload_fraction(&self) -> f32 {
        match self.state {
            ShipState::Reloading { elapsed } => (elapsed / self.stats.reload_time).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// Advance reload and repair-cooldown counters
    pub fn advance_timers(&mut self, dt: f32) {
        self.repair_cooldown = (self.repair_cooldown - dt).max(0.0);
        if let ShipState::Reloading { elapsed } = self.state {
            let elapsed = elapsed + dt;
            let deadline = self.stats.reload_time * (1.0 - TIMER_TOLERANCE);
            self.state = if elapsed >= deadline {
                ShipState::Ready
            } else {
                ShipState::Reloading { elapsed }
            };
        }
    }

    /// Resolve the player's hull touching something solid
    ///
    /// `normal` is the unit direction from the player toward the other body.
    pub fn resolve_impact(
        &mut self,
        normal: Vec2,
        flags: &GameFlags,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> Impact {
        let impact = classify_impact(normal, flags.player_takes_damage);
        if self.is_sinking() {
            return impact;
        }
        let damage = self.stats.impact_damage;
        match impact {
            Impact::HeadOn => self.sink(true, events),
            Impact::Side => {
                if let Behavior::Player(control) = &mut self.behavior {
                    control.knockback = Some(Knockback {
                        remaining: tuning.knockback_time,
                        direction: Vec2::new(0.0, -normal.y.signum()),
                        force: tuning.knockback_force,
                    });
                }
                self.take_damage(damage, false, flags, events);
            }
            Impact::Glancing => {
                self.take_damage(damage, false, flags, events);
            }
            Impact::Astern => {}
        }
        impact
    }

    fn check_finite(&self) -> Result<(), EntityFault> {
        if !self.position.is_finite() {
            return Err(EntityFault::NonFinite {
                entity: self.id,
                field: "position",
            });
        }
        if !self.stats.hit_points.is_finite() {
            return Err(EntityFault::NonFinite {
                entity: self.id,
                field: "hit_points",
            });
        }
        Ok(())
    }

    fn update_player(&mut self, ctx: &mut ShipContext<'_>) {
        let dt = ctx.dt;

        let knockback = match &mut self.behavior {
            Behavior::Player(control) => {
                let current = control.knockback;
                if let Some(k) = control.knockback.as_mut() {
                    k.remaining -= dt;
                    if k.remaining <= 0.0 {
                        control.knockback = None;
                    }
                }
                current
            }
            Behavior::Enemy(_) => None,
        };

        if let Some(k) = knockback {
            self.position += k.direction * k.force * dt;
        } else if let Some(target) = ctx.input.steer {
            let target = clamp_to_play_area(target);
            let step = ctx.tuning.ship_speed * PLAYER_STEER_FACTOR * dt;
            let delta = target - self.position;
            let distance = delta.length();
            if distance <= step {
                self.position = target;
            } else if distance > 0.0 {
                self.position += delta / distance * step;
            }
        }
        self.position = clamp_to_play_area(self.position);

        if let Some(aim) = ctx.input.fire_at {
            self.shoot(aim);
        }
    }

    fn update_enemy(&mut self, ctx: &mut ShipContext<'_>) -> Result<(), EntityFault> {
        let interval = ctx.tuning.enemy_fire_interval;
        let due = match &mut self.behavior {
            Behavior::Enemy(control) => {
                control.check_timer += ctx.dt;
                if control.check_timer >= interval {
                    control.check_timer -= interval;
                    true
                } else {
                    false
                }
            }
            Behavior::Player(_) => false,
        };
        if !due {
            return Ok(());
        }

        let player = ctx.player_position.ok_or(EntityFault::MissingReference {
            entity: self.id,
            what: "player position",
        })?;
        if ctx.flags.enemies_may_fire
            && !self.is_reloading()
            && self.position.distance(player) <= ctx.tuning.enemy_fire_range
        {
            self.shoot(player);
        }
        Ok(())
    }
}

impl<'a> Updatable<ShipContext<'a>> for CombatEntity {
    fn is_active(&self, ctx: &ShipContext<'a>) -> bool {
        if !self.enabled || self.is_sinking() || !ctx.flags.is_playing() {
            return false;
        }
        match self.behavior {
            Behavior::Player(_) => true,
            Behavior::Enemy(_) => ctx.tuning.in_view(self.position.x),
        }
    }

    fn update(&mut self, ctx: &mut ShipContext<'a>) -> Result<(), EntityFault> {
        self.check_finite()?;

        let was_reloading = self.is_reloading();
        self.advance_timers(ctx.dt);
        let repaired = self.repair(ctx.dt);

        if self.is_player() {
            if repaired {
                ctx.events.push(GameEvent::HealthChanged {
                    fraction: self.stats.health_fraction(),
                });
            }
            if was_reloading {
                ctx.events.push(GameEvent::ReloadProgress {
                    fraction: self.reload_fraction(),
                });
            }
            self.update_player(ctx);
            Ok(())
        } else {
            self.update_enemy(ctx)
        }
    }
}

/// Keep a point inside the player's play area
pub fn clamp_to_play_area(p: Vec2) -> Vec2 {
    Vec2::new(
        crate::clamp_finite(p.x, PLAYER_MIN_X, PLAYER_MAX_X),
        crate::clamp_finite(p.y, PLAYER_MIN_Y, PLAYER_MAX_Y),
    )
}
