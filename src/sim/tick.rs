//! Fixed timestep simulation tick
//!
//! Advances a [`Battle`] by one step. The order inside a tick is:
//! 1. scroll the course (and recycle endless blocks)
//! 2. ship updates through the scheduler
//! 3. cannonball flight and hits
//! 4. hull contacts and the goal island
//! 5. bounty, score and outcome bookkeeping
//!
//! Cross-ship effects only happen in steps 3-5, after every ship has updated,
//! so the scheduler's ordering never changes the result.

use glam::Vec2;

use super::collision::{circle_aabb_overlap, contact_normal};
use super::scheduler::TickReport;
use super::ship::ShipContext;
use super::state::{Battle, ContactKey, Course, GameEvent, GameMode, Outcome};
use crate::consts::CANNONBALL_RADIUS;
use crate::scaling::ship_bounty;

/// Input intents for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Point the player ship steers toward
    pub steer: Option<Vec2>,
    /// Point the player's cannons aim at; fires when loaded
    pub fire_at: Option<Vec2>,
}

/// Advance the battle by `dt` seconds
pub fn tick(battle: &mut Battle, input: &TickInput, dt: f32) -> TickReport {
    if !battle.flags.is_playing() || battle.outcome.is_some() {
        return TickReport::default();
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    battle.time_ticks += 1;
    let first_event = battle.events.len();

    if battle.flags.move_map {
        scroll_course(battle, battle.tuning.map_speed * dt);
    }

    let player_position = battle.player().map(|p| p.position);
    let report = {
        let mut ctx = ShipContext {
            dt,
            flags: &battle.flags,
            input,
            player_position,
            tuning: &battle.tuning,
            events: &mut battle.events,
        };
        battle.ships.tick(&mut ctx)
    };

    resolve_cannonballs(battle, dt);
    resolve_contacts(battle);
    check_goal(battle);
    settle_sinkings(battle, first_event);

    report
}

/// Move the course, its enemies and obstacles toward the player
fn scroll_course(battle: &mut Battle, distance: f32) {
    if distance <= 0.0 {
        return;
    }
    for enemy in battle.ships.iter_mut().filter(|s| !s.is_player()) {
        enemy.position.x -= distance;
    }

    match &mut battle.course {
        Course::Classic(layout) => layout.scroll(-distance),
        Course::Endless(map) => {
            let recycled = map.scroll(distance);
            let level = map.level();
            for index in recycled {
                let Some(entry) = map.block(index) else {
                    continue;
                };
                // Enemy for block i is registered right after the player
                if let Some(enemy) = battle.ships.get_mut(index + 1) {
                    enemy.reset_for_level(level, entry.enemy_position(), &battle.tuning);
                    enemy.enabled = entry.enemy_active;
                }
            }
        }
    }
}

/// Fly every cannonball and apply hits on ships of the other faction
fn resolve_cannonballs(battle: &mut Battle, dt: f32) {
    let ships = battle.ships.as_mut_slice();
    for shooter in 0..ships.len() {
        ships[shooter].pool_mut().advance(dt);
        let faction = ships[shooter].faction();

        let mut hits = Vec::new();
        for ball in ships[shooter].pool().in_flight_iter() {
            let target = ships.iter().position(|s| {
                s.faction() != faction
                    && s.is_targetable()
                    && circle_aabb_overlap(ball.pos, CANNONBALL_RADIUS, &s.hull())
            });
            if let Some(target) = target {
                hits.push((ball.slot, target, ball.damage));
            }
        }

        for (slot, target, damage) in hits {
            ships[target].take_damage(damage, false, &battle.flags, &mut battle.events);
            ships[shooter].pool_mut().retire(slot);
        }
    }
}

/// Resolve the player's hull against enemies, obstacles and river banks.
/// Only contacts that began this tick count.
fn resolve_contacts(battle: &mut Battle) {
    let Some(player) = battle.player().filter(|p| p.is_targetable()) else {
        battle.contacts.clear();
        return;
    };
    let hull = player.hull();
    let center = player.position;

    let mut touching: Vec<(ContactKey, Vec2, Option<usize>)> = battle
        .ships
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_player() && s.is_targetable() && hull.overlaps(&s.hull()))
        .map(|(i, s)| (ContactKey::Ship(s.id), s.position, Some(i)))
        .collect();
    touching.extend(
        battle
            .obstacle_footprints()
            .into_iter()
            .filter(|(_, aabb)| hull.overlaps(aabb))
            .map(|(key, aabb)| (key, aabb.center, None)),
    );
    // A bank pushes straight across the lane, wherever along it the hull is
    touching.extend(
        battle
            .bank_footprints()
            .into_iter()
            .filter(|(_, aabb)| hull.overlaps(aabb))
            .map(|(key, aabb)| (key, Vec2::new(center.x, aabb.center.y), None)),
    );

    let previous = std::mem::take(&mut battle.contacts);
    for (key, other, enemy) in touching {
        // Adjoining bank segments share a key and count once
        if !battle.contacts.insert(key) || previous.contains(&key) {
            continue;
        }
        let normal = contact_normal(center, other);
        if let Some(player) = battle.ships.get_mut(0) {
            let impact =
                player.resolve_impact(normal, &battle.flags, &battle.tuning, &mut battle.events);
            log::debug!("Player hull contact {:?}: {:?}", key, impact);
        }
        if let Some(index) = enemy {
            if let Some(ship) = battle.ships.get_mut(index) {
                let damage = ship.stats.impact_damage;
                ship.take_damage(damage, true, &battle.flags, &mut battle.events);
            }
        }
    }
}

/// Reaching the island completes a classic level
fn check_goal(battle: &mut Battle) {
    if battle.outcome.is_some() {
        return;
    }
    let (Some(island), Some(player)) = (battle.island(), battle.player()) else {
        return;
    };
    if player.is_sinking() || !player.hull().overlaps(&island) {
        return;
    }
    let level = battle.level();
    log::info!("Level {} complete", level);
    battle.outcome = Some(Outcome::LevelComplete);
    battle.flags.game_over = true;
    battle.events.push(GameEvent::LevelComplete { level });
}

/// Pay bounties for enemies sunk this tick and end the battle if the player sank
fn settle_sinkings(battle: &mut Battle, first_event: usize) {
    let mut enemies_sunk = 0u32;
    let mut player_sunk = false;
    for event in &battle.events[first_event..] {
        match event {
            GameEvent::EnemySunk { .. } => enemies_sunk += 1,
            GameEvent::PlayerSunk { .. } => player_sunk = true,
            _ => {}
        }
    }

    if enemies_sunk > 0 {
        let bounty = ship_bounty(battle.level());
        battle.run_gold += bounty * enemies_sunk as u64;
        battle.run_score += enemies_sunk as u64;
        battle.ship_count = match battle.mode() {
            GameMode::Classic => battle.ship_count.saturating_sub(enemies_sunk),
            GameMode::Endless => battle.ship_count + enemies_sunk,
        };
        battle.events.push(GameEvent::ShipCountChanged {
            count: battle.ship_count,
        });
    }

    if player_sunk && battle.outcome.is_none() {
        battle.outcome = Some(Outcome::PlayerSunk);
        battle.flags.game_over = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::consts::SIM_DT;
    use crate::map::{BankSide, TerrainKind};
    use crate::progress::ProgressRecord;
    use crate::sim::ship::CombatEntity;

    fn quiet_classic(level: i32) -> Battle {
        let mut battle = Battle::classic(level, &ProgressRecord::new(), Tuning::default());
        battle.flags.move_map = false;
        battle.drain_events();
        battle
    }

    #[test]
    fn test_paused_battle_does_not_advance() {
        let mut battle = quiet_classic(3);
        battle.flags.paused = true;
        let report = tick(&mut battle, &TickInput::default(), SIM_DT);
        assert_eq!(report, TickReport::default());
        assert_eq!(battle.time_ticks, 0);
    }

    #[test]
    fn test_scroll_moves_enemies_with_course() {
        let mut battle = Battle::classic(15, &ProgressRecord::new(), Tuning::default());
        battle.flags.enemies_may_fire = false;
        let before: Vec<f32> = battle.enemies().map(|e| e.position.x).collect();
        let island = battle.island().unwrap().center.x;
        tick(&mut battle, &TickInput::default(), 1.0);
        let after: Vec<f32> = battle.enemies().map(|e| e.position.x).collect();
        for (a, b) in after.iter().zip(&before) {
            assert!((a - (b - 15.0)).abs() < 1e-3);
        }
        assert!((battle.island().unwrap().center.x - (island - 15.0)).abs() < 1e-3);
    }

    #[test]
    fn test_player_cannonball_sinks_tutorial_ship() {
        let mut battle = quiet_classic(0);
        // Bring the tutorial ship within a second of flight
        battle.ships.get_mut(1).unwrap().position = Vec2::new(60.0, 0.0);
        battle.player_mut().unwrap().stats.accuracy = 100.0;

        let input = TickInput {
            steer: None,
            fire_at: Some(Vec2::new(60.0, 0.0)),
        };
        let mut events = Vec::new();
        for _ in 0..120 {
            tick(&mut battle, &input, SIM_DT);
            events.extend(battle.drain_events());
        }
        assert!(battle.ships.get(1).unwrap().is_sinking());
        assert!(events.contains(&GameEvent::EnemySunk { id: 1, rammed: false }));
        assert!(events.contains(&GameEvent::ShipCountChanged { count: 0 }));
        assert_eq!(battle.run_score, 1);
        assert_eq!(battle.run_gold, ship_bounty(0));
        // The ball that hit went back to the player's pool
        let pool = battle.player().unwrap().pool();
        assert_eq!(pool.available() + pool.in_flight(), pool.capacity());
    }

    #[test]
    fn test_ramming_an_enemy_once() {
        let mut battle = quiet_classic(2);
        battle.flags.enemies_may_fire = false;
        let player_pos = battle.player().unwrap().position;
        // Park an enemy against the player's beam
        let enemy = battle.ships.get_mut(1).unwrap();
        enemy.position = player_pos + Vec2::new(0.0, 4.0);
        let enemy_hp = enemy.stats.hit_points;
        let player_hp = battle.player().unwrap().stats.hit_points;

        tick(&mut battle, &TickInput::default(), SIM_DT);
        let player = battle.player().unwrap();
        assert!(player.stats.hit_points < player_hp);
        assert!(player.knockback().is_some());
        assert!(battle.ships.get(1).unwrap().stats.hit_points < enemy_hp);

        // Still touching next tick: no second hit
        let hp = battle.player().unwrap().stats.hit_points;
        let beside = battle.player().unwrap().position + Vec2::new(0.0, 4.0);
        battle.ships.get_mut(1).unwrap().position = beside;
        tick(&mut battle, &TickInput::default(), SIM_DT);
        assert_eq!(battle.player().unwrap().stats.hit_points, hp);
    }

    #[test]
    fn test_head_on_ram_ends_the_battle() {
        let mut battle = quiet_classic(4);
        battle.flags.enemies_may_fire = false;
        let player_pos = battle.player().unwrap().position;
        battle.ships.get_mut(1).unwrap().position = player_pos + Vec2::new(10.0, 0.0);

        tick(&mut battle, &TickInput::default(), SIM_DT);
        assert_eq!(battle.outcome, Some(Outcome::PlayerSunk));
        assert!(battle.flags.game_over);
        let events = battle.drain_events();
        assert!(events.contains(&GameEvent::PlayerSunk { rammed: true }));

        // Nothing moves after the end
        let ticks = battle.time_ticks;
        tick(&mut battle, &TickInput::default(), SIM_DT);
        assert_eq!(battle.time_ticks, ticks);
    }

    #[test]
    fn test_steering_into_a_river_bank() {
        let mut battle = quiet_classic(2);
        battle.flags.enemies_may_fire = false;
        for ship in battle.ships.iter_mut().filter(|s| !s.is_player()) {
            ship.enabled = false;
        }
        let Course::Classic(layout) = &mut battle.course else {
            panic!("classic course expected");
        };
        layout.obstacles.clear();
        // The player starts in block 0; make it the narrowest river
        layout.blocks[0].kind = TerrainKind::River { variant: 2 };
        layout.blocks[1].kind = TerrainKind::River { variant: 2 };
        let start_hp = battle.player().unwrap().stats.hit_points;

        let input = TickInput {
            steer: Some(Vec2::new(10.0, 25.0)),
            fire_at: None,
        };
        let mut ticks = 0;
        while battle.player().unwrap().stats.hit_points == start_hp && ticks < 600 {
            tick(&mut battle, &input, SIM_DT);
            ticks += 1;
        }
        let player = battle.player().unwrap();
        assert!(player.stats.hit_points < start_hp, "never reached the bank");
        assert!(!player.is_sinking());
        assert!(battle.contacts.contains(&ContactKey::Bank(BankSide::North)));
        // Knocked back toward open water
        let knockback = player.knockback().unwrap();
        assert_eq!(knockback.direction, Vec2::new(0.0, -1.0));
        // The hull reached no further than the bank's edge plus one step
        assert!(player.hull().max().y < 14.0);

        // One hit per contact, however many bank segments touch
        let hp = player.stats.hit_points;
        tick(&mut battle, &input, SIM_DT);
        assert_eq!(battle.player().unwrap().stats.hit_points, hp);
        assert_eq!(battle.outcome, None);
    }

    #[test]
    fn test_open_ocean_has_no_banks() {
        let mut battle = quiet_classic(2);
        battle.flags.enemies_may_fire = false;
        for ship in battle.ships.iter_mut().filter(|s| !s.is_player()) {
            ship.enabled = false;
        }
        let Course::Classic(layout) = &mut battle.course else {
            panic!("classic course expected");
        };
        layout.obstacles.clear();
        for block in &mut layout.blocks {
            block.kind = TerrainKind::Ocean;
        }
        let start_hp = battle.player().unwrap().stats.hit_points;

        let input = TickInput {
            steer: Some(Vec2::new(10.0, 25.0)),
            fire_at: None,
        };
        for _ in 0..300 {
            tick(&mut battle, &input, SIM_DT);
        }
        let player = battle.player().unwrap();
        assert_eq!(player.stats.hit_points, start_hp);
        assert!(player.position.y > 20.0);
    }

    #[test]
    fn test_reaching_the_island() {
        let mut battle = Battle::classic(1, &ProgressRecord::new(), Tuning::default());
        battle.flags.enemies_may_fire = false;
        battle.flags.player_takes_damage = false;
        // Clear the course so nothing blocks the run
        for ship in battle.ships.iter_mut().filter(|s| !s.is_player()) {
            ship.enabled = false;
        }
        if let Course::Classic(layout) = &mut battle.course {
            layout.obstacles.clear();
        }

        let mut completions = 0;
        for _ in 0..(60 * 60) {
            tick(&mut battle, &TickInput::default(), SIM_DT);
            completions += battle
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::LevelComplete { .. }))
                .count();
        }
        assert_eq!(battle.outcome, Some(Outcome::LevelComplete));
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_endless_recycles_enemies() {
        let mut battle = Battle::endless(11, &ProgressRecord::new(), Tuning::default());
        battle.flags.enemies_may_fire = false;
        battle.flags.enemy_takes_damage = false;
        battle.flags.player_takes_damage = false;
        let first_enemy_x = battle.ships.get(1).unwrap().position.x;

        // 101 units of travel pushes block 0 behind the recycle line
        for _ in 0..((101.0 / (15.0 * SIM_DT)) as usize + 2) {
            tick(&mut battle, &TickInput::default(), SIM_DT);
        }
        let Course::Endless(map) = &battle.course else {
            panic!("endless course expected");
        };
        assert!(map.recycled_count() >= 1);
        let entry = map.block(0).unwrap();
        let enemy: &CombatEntity = battle.ships.get(1).unwrap();
        assert!(enemy.position.x > first_enemy_x);
        assert!((enemy.position - entry.enemy_position()).length() < 1e-3);
        assert_eq!(enemy.enabled, entry.enemy_active);
        assert_eq!(battle.ships.len(), 4);
    }
}
