//! End-to-end battle runs through the public API

use std::cell::RefCell;
use std::rc::Rc;

use broadside::ServiceError;
use broadside::config::Tuning;
use broadside::consts::SIM_DT;
use broadside::hooks::{Hooks, PlatformServices, Presentation};
use broadside::map::generate_classic_map;
use broadside::progress::{MemoryStore, ProgressRecord};
use broadside::sim::{Battle, Course, GameEvent, Outcome, TickInput, tick};
use glam::Vec2;

#[derive(Clone, Default)]
struct Log(Rc<RefCell<Vec<String>>>);

impl Presentation for Log {
    fn on_ship_count_changed(&mut self, count: u32) {
        self.0.borrow_mut().push(format!("ships {count}"));
    }
}

impl PlatformServices for Log {
    fn on_level_complete(&mut self, level: i32) -> Result<(), ServiceError> {
        self.0.borrow_mut().push(format!("complete {level}"));
        Ok(())
    }
}

fn run(battle: &mut Battle, hooks: &mut Hooks, input: &TickInput, seconds: f32) {
    let ticks = (seconds / SIM_DT) as usize;
    for _ in 0..ticks {
        if battle.is_over() {
            break;
        }
        tick(battle, input, SIM_DT);
        let events = battle.drain_events();
        hooks.dispatch(&events);
    }
}

#[test]
fn classic_level_reaches_the_island_and_settles() {
    let log = Log::default();
    let mut hooks = Hooks::new()
        .with_presentation(log.clone())
        .with_platform(log.clone())
        .with_persistence(MemoryStore::new(ProgressRecord::new()));

    let mut battle = Battle::classic(1, &hooks.progress(), Tuning::default());
    battle.flags.player_takes_damage = false;
    battle.flags.enemies_may_fire = false;
    for ship in battle.ships.iter_mut().filter(|s| !s.is_player()) {
        ship.enabled = false;
    }
    if let Course::Classic(layout) = &mut battle.course {
        layout.obstacles.clear();
    }

    run(&mut battle, &mut hooks, &TickInput::default(), 60.0);

    assert_eq!(battle.outcome, Some(Outcome::LevelComplete));
    let settlement = battle.settle(&mut hooks).expect("battle ended");
    assert_eq!(settlement.cleared_level, Some(1));
    assert_eq!(settlement.score, 0);

    let progress = hooks.progress();
    assert_eq!(progress.highest_level, 1);
    assert_eq!(progress.next_level(), 2);
    assert_eq!(progress.player_gold, settlement.gold);
    assert!(settlement.gold > 0);

    let entries = log.0.borrow();
    assert_eq!(entries.first().map(String::as_str), Some("ships 2"));
    assert_eq!(entries.iter().filter(|e| *e == "complete 1").count(), 1);
}

#[test]
fn same_level_same_course() {
    let a = Battle::classic(37, &ProgressRecord::new(), Tuning::default());
    let b = Battle::classic(37, &ProgressRecord::new(), Tuning::default());
    let positions = |battle: &Battle| battle.enemies().map(|e| e.position).collect::<Vec<_>>();
    assert_eq!(positions(&a), positions(&b));
    assert_eq!(a.obstacle_footprints(), b.obstacle_footprints());
    assert_eq!(generate_classic_map(37), generate_classic_map(37));
}

#[test]
fn enemies_sink_the_idle_player() {
    let mut hooks = Hooks::new().with_persistence(MemoryStore::new(ProgressRecord::new()));
    let mut battle = Battle::classic(30, &hooks.progress(), Tuning::default());
    battle.flags.move_map = false;
    // Bring every enemy into range, spaced across the lane
    for (i, ship) in battle.ships.iter_mut().filter(|s| !s.is_player()).enumerate() {
        ship.position = Vec2::new(60.0 + i as f32 * 20.0, -20.0 + i as f32 * 12.0);
    }

    let mut sunk = false;
    for _ in 0..(120.0 / SIM_DT) as usize {
        tick(&mut battle, &TickInput::default(), SIM_DT);
        let events = battle.drain_events();
        sunk |= events.contains(&GameEvent::PlayerSunk { rammed: false });
        hooks.dispatch(&events);
        if battle.is_over() {
            break;
        }
    }

    assert!(sunk);
    assert_eq!(battle.outcome, Some(Outcome::PlayerSunk));
    let settlement = battle.settle(&mut hooks).expect("battle ended");
    assert_eq!(settlement.gold, 0);
    assert_eq!(hooks.progress().highest_level, -1);
}

#[test]
fn endless_run_keeps_three_blocks_and_raises_difficulty() {
    let mut hooks = Hooks::new().with_persistence(MemoryStore::new(ProgressRecord::new()));
    let mut battle = Battle::endless(2024, &hooks.progress(), Tuning::default());
    battle.flags.player_takes_damage = false;
    battle.flags.enemies_may_fire = false;

    run(&mut battle, &mut hooks, &TickInput::default(), 35.0);

    assert!(!battle.is_over());
    let Course::Endless(map) = &battle.course else {
        panic!("endless course expected");
    };
    // 35 s at 15 u/s is 525 units: three level steps of 150
    assert_eq!(map.level(), 4);
    assert_eq!(map.blocks().len(), 3);
    assert!(map.recycled_count() >= 5);
    assert_eq!(battle.ships.len(), 4);
    for (i, entry) in map.blocks().iter().enumerate() {
        let enemy = battle.ships.get(i + 1).expect("enemy per block");
        if enemy.is_targetable() {
            assert!((enemy.position - entry.enemy_position()).length() < 1e-2);
        }
    }
}

#[test]
fn endless_bounties_feed_the_high_score() {
    let mut hooks = Hooks::new().with_persistence(MemoryStore::new(ProgressRecord::new()));
    let mut battle = Battle::endless(8, &hooks.progress(), Tuning::default());
    battle.flags.move_map = false;
    battle.flags.enemies_may_fire = false;

    // Line up the second block's enemy in front of the player
    let aim = Vec2::new(50.0, 0.0);
    let enemy = battle.ships.get_mut(2).expect("second enemy");
    enemy.position = aim;
    enemy.enabled = true;
    battle.player_mut().expect("player").stats.accuracy = 100.0;

    let input = TickInput {
        steer: None,
        fire_at: Some(aim),
    };
    let mut sunk_events = 0;
    for _ in 0..(30.0 / SIM_DT) as usize {
        tick(&mut battle, &input, SIM_DT);
        sunk_events += battle
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemySunk { id: 2, .. }))
            .count();
        if sunk_events > 0 {
            break;
        }
    }
    assert_eq!(sunk_events, 1);
    assert_eq!(battle.run_score, 1);
    assert_eq!(battle.ship_count, 1);

    battle.outcome = Some(Outcome::PlayerSunk);
    let settlement = battle.settle(&mut hooks).expect("battle ended");
    assert_eq!(settlement.score, 1);
    let progress = hooks.progress();
    assert_eq!(progress.high_score, 1);
    assert_eq!(progress.player_gold, battle.run_gold);
    assert_eq!(progress.lifetime_ships_sunk, 1);
}
