//! Broadside headless runner
//!
//! Plays battles with a simple autopilot and logs what happened.
//!
//! ```text
//! broadside [--classic <LEVEL>] [--endless <SEED>] [--tuning <FILE>] [--seconds <SECONDS>]
//! ```
//!
//! With no mode given it plays classic level 1 and then an endless run.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::{Path, PathBuf};

    use broadside::config::Tuning;
    use broadside::consts::*;
    use broadside::hooks::{Hooks, Presentation};
    use broadside::progress::{MemoryStore, ProgressRecord};
    use broadside::sim::{Battle, TickInput, tick};
    use clap::Parser;
    use glam::Vec2;

    /// Largest sideways step the autopilot takes to get out of a line of fire
    const DODGE_OFFSET: f32 = 9.0;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Mode {
        Classic(i32),
        Endless(u64),
    }

    #[derive(Debug, Parser)]
    #[command(author, version, about, long_about = None)]
    pub(crate) struct CliArgs {
        /// Classic level to play.
        #[arg(long, value_name = "LEVEL")]
        pub(crate) classic: Option<i32>,
        /// Seed of an endless run to play.
        #[arg(long, value_name = "SEED")]
        pub(crate) endless: Option<u64>,
        /// JSON file with tuning overrides.
        #[arg(long, value_name = "FILE")]
        pub(crate) tuning: Option<PathBuf>,
        /// Simulated seconds before a battle is abandoned.
        #[arg(long, value_name = "SECONDS", default_value_t = 120.0)]
        pub(crate) seconds: f32,
    }

    impl CliArgs {
        /// Battles to play, classic first
        pub(crate) fn modes(&self) -> Vec<Mode> {
            let modes: Vec<Mode> = self
                .classic
                .map(Mode::Classic)
                .into_iter()
                .chain(self.endless.map(Mode::Endless))
                .collect();
            if modes.is_empty() {
                vec![Mode::Classic(1), Mode::Endless(0)]
            } else {
                modes
            }
        }
    }

    fn load_tuning(path: Option<&Path>) -> Tuning {
        let Some(path) = path else {
            return Tuning::default();
        };
        match std::fs::read_to_string(path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::warn!("Invalid tuning in {}: {}, using defaults", path.display(), e);
                    Tuning::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {}: {}, using defaults", path.display(), e);
                Tuning::default()
            }
        }
    }

    /// Logs HUD updates that matter for a headless run
    struct LogPresentation;

    impl Presentation for LogPresentation {
        fn on_ship_count_changed(&mut self, count: u32) {
            log::info!("Ships: {}", count);
        }
    }

    /// Stay mid-lane, dodge toward open water and shoot the closest enemy
    fn autopilot(battle: &Battle) -> TickInput {
        let Some(player) = battle.player() else {
            return TickInput::default();
        };
        let target = battle
            .enemies()
            .filter(|e| e.is_targetable() && e.position.x > player.position.x)
            .min_by(|a, b| {
                a.position
                    .distance_squared(player.position)
                    .total_cmp(&b.position.distance_squared(player.position))
            });

        // Dodges stay near mid-lane so river banks are never clipped
        let lane = match target {
            Some(enemy) if (enemy.position.y - player.position.y).abs() < SHIP_HALF_BEAM * 3.0 => {
                if enemy.position.y > 0.0 {
                    -DODGE_OFFSET
                } else {
                    DODGE_OFFSET
                }
            }
            _ => player.position.y.clamp(-DODGE_OFFSET, DODGE_OFFSET),
        };
        TickInput {
            steer: Some(Vec2::new(PLAYER_START_X, lane)),
            fire_at: target
                .filter(|e| e.position.distance(player.position) < battle.tuning.enemy_fire_range)
                .map(|e| e.position),
        }
    }

    pub fn run() {
        let args = CliArgs::parse();
        let tuning = load_tuning(args.tuning.as_deref());

        let mut hooks = Hooks::new()
            .with_presentation(LogPresentation)
            .with_persistence(MemoryStore::new(ProgressRecord::new()));

        for mode in args.modes() {
            let progress = hooks.progress();
            let mut battle = match mode {
                Mode::Classic(level) => Battle::classic(level, &progress, tuning.clone()),
                Mode::Endless(seed) => Battle::endless(seed, &progress, tuning.clone()),
            };
            play(&mut battle, &mut hooks, args.seconds);
        }
    }

    fn play(battle: &mut Battle, hooks: &mut Hooks, seconds: f32) {
        let max_ticks = (seconds.max(0.0) / SIM_DT) as u64;
        while battle.time_ticks < max_ticks && !battle.is_over() {
            let input = autopilot(battle);
            let report = tick(battle, &input, SIM_DT);
            if report.faulted > 0 {
                log::warn!("{} ship updates faulted on tick {}", report.faulted, battle.time_ticks);
            }
            let events = battle.drain_events();
            hooks.dispatch(&events);
        }

        if !battle.is_over() {
            log::info!(
                "{:?} battle stopped after {:.1}s at level {} without an outcome",
                battle.mode(),
                battle.time_ticks as f32 * SIM_DT,
                battle.level()
            );
            return;
        }
        if let Some(settlement) = battle.settle(hooks) {
            let progress = hooks.progress();
            log::info!(
                "{:?} battle: {:?} after {:.1}s, +{} gold, {} sunk (total gold {}, high score {})",
                battle.mode(),
                battle.outcome,
                battle.time_ticks as f32 * SIM_DT,
                settlement.gold,
                settlement.ships_sunk,
                progress.player_gold,
                progress.high_score
            );
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        #[test]
        fn test_cli_definition() {
            CliArgs::command().debug_assert();
        }

        #[test]
        fn test_default_modes() {
            let args = CliArgs::try_parse_from(["broadside"]).unwrap();
            assert_eq!(args.modes(), vec![Mode::Classic(1), Mode::Endless(0)]);
            assert_eq!(args.seconds, 120.0);
            assert!(args.tuning.is_none());
        }

        #[test]
        fn test_explicit_modes() {
            let args = CliArgs::try_parse_from([
                "broadside",
                "--endless",
                "42",
                "--seconds",
                "30",
                "--tuning",
                "brutal.json",
            ])
            .unwrap();
            assert_eq!(args.modes(), vec![Mode::Endless(42)]);
            assert_eq!(args.seconds, 30.0);
            assert_eq!(args.tuning, Some(PathBuf::from("brutal.json")));

            let both =
                CliArgs::try_parse_from(["broadside", "--classic", "7", "--endless", "1"]).unwrap();
            assert_eq!(both.modes(), vec![Mode::Classic(7), Mode::Endless(1)]);
        }

        #[test]
        fn test_bad_level_is_rejected() {
            assert!(CliArgs::try_parse_from(["broadside", "--classic", "deep"]).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Broadside (headless) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by its host on wasm
}
