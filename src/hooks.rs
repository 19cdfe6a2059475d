//! Collaborator seams
//!
//! The simulation never talks to UI, platform SDKs or storage directly. It
//! collects [`GameEvent`]s during a tick and [`Hooks::dispatch`] forwards them
//! to whichever collaborators are installed. Any of them may be absent.
//! Platform-service failures are logged and dropped here; they never reach
//! the simulation.

use crate::error::ServiceError;
use crate::progress::{ProgressRecord, Settlement};
use crate::sim::GameEvent;

/// UI listener for value-changed notifications
pub trait Presentation {
    fn on_health_changed(&mut self, _fraction: f32) {}
    fn on_reload_progress(&mut self, _fraction: f32) {}
    fn on_ship_count_changed(&mut self, _count: u32) {}
}

/// Ads, achievements, leaderboards, cloud sync
pub trait PlatformServices {
    fn on_enemy_sunk(&mut self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_player_sunk(&mut self, _rammed: bool) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_level_complete(&mut self, _level: i32) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Owner of the player progress record
pub trait Persistence {
    fn progress(&self) -> ProgressRecord;
    fn record_score_delta(&mut self, score: u64);
    fn record_gold_delta(&mut self, gold: u64);

    /// Called once when a battle ends, after the deltas
    fn record_settlement(&mut self, _settlement: &Settlement) {}
}

/// Installed collaborators
#[derive(Default)]
pub struct Hooks {
    presentation: Option<Box<dyn Presentation>>,
    platform: Option<Box<dyn PlatformServices>>,
    persistence: Option<Box<dyn Persistence>>,
    service_failures: u32,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("presentation", &self.presentation.is_some())
            .field("platform", &self.platform.is_some())
            .field("persistence", &self.persistence.is_some())
            .field("service_failures", &self.service_failures)
            .finish()
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presentation(mut self, presentation: impl Presentation + 'static) -> Self {
        self.presentation = Some(Box::new(presentation));
        self
    }

    pub fn with_platform(mut self, platform: impl PlatformServices + 'static) -> Self {
        self.platform = Some(Box::new(platform));
        self
    }

    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    /// Current progress, or a fresh record when nothing is persisted
    pub fn progress(&self) -> ProgressRecord {
        self.persistence
            .as_ref()
            .map(|p| p.progress())
            .unwrap_or_default()
    }

    /// Platform calls that failed so far
    pub fn service_failures(&self) -> u32 {
        self.service_failures
    }

    /// Forward one tick's events
    pub fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::HealthChanged { fraction } => {
                    if let Some(p) = self.presentation.as_mut() {
                        p.on_health_changed(fraction);
                    }
                }
                GameEvent::ReloadProgress { fraction } => {
                    if let Some(p) = self.presentation.as_mut() {
                        p.on_reload_progress(fraction);
                    }
                }
                GameEvent::ShipCountChanged { count } => {
                    if let Some(p) = self.presentation.as_mut() {
                        p.on_ship_count_changed(count);
                    }
                }
                GameEvent::EnemySunk { .. } => {
                    self.call_platform("enemy sunk", |s| s.on_enemy_sunk());
                }
                GameEvent::PlayerSunk { rammed } => {
                    self.call_platform("player sunk", |s| s.on_player_sunk(rammed));
                }
                GameEvent::LevelComplete { level } => {
                    self.call_platform("level complete", |s| s.on_level_complete(level));
                }
            }
        }
    }

    /// Report a finished battle to persistence
    pub fn settle(&mut self, settlement: &Settlement) {
        let Some(store) = self.persistence.as_mut() else {
            log::debug!("No persistence installed, dropping settlement");
            return;
        };
        if settlement.score > 0 {
            store.record_score_delta(settlement.score);
        }
        if settlement.gold > 0 {
            store.record_gold_delta(settlement.gold);
        }
        store.record_settlement(settlement);
    }

    fn call_platform(
        &mut self,
        what: &str,
        call: impl FnOnce(&mut dyn PlatformServices) -> Result<(), ServiceError>,
    ) {
        let Some(platform) = self.platform.as_mut() else {
            return;
        };
        if let Err(e) = call(platform.as_mut()) {
            log::warn!("Platform service call '{}' failed: {}", what, e);
            self.service_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Presentation for Recorder {
        fn on_health_changed(&mut self, fraction: f32) {
            self.0.borrow_mut().push(format!("health {fraction}"));
        }

        fn on_ship_count_changed(&mut self, count: u32) {
            self.0.borrow_mut().push(format!("ships {count}"));
        }
    }

    struct Offline;

    impl PlatformServices for Offline {
        fn on_enemy_sunk(&mut self) -> Result<(), ServiceError> {
            Err(ServiceError::Unavailable("no network".into()))
        }
    }

    #[test]
    fn test_absent_collaborators_are_tolerated() {
        let mut hooks = Hooks::new();
        hooks.dispatch(&[
            GameEvent::HealthChanged { fraction: 0.5 },
            GameEvent::EnemySunk { id: 1, rammed: false },
            GameEvent::LevelComplete { level: 3 },
        ]);
        hooks.settle(&Settlement::default());
        assert_eq!(hooks.progress(), ProgressRecord::new());
    }

    #[test]
    fn test_presentation_receives_values() {
        let recorder = Recorder::default();
        let mut hooks = Hooks::new().with_presentation(recorder.clone());
        hooks.dispatch(&[
            GameEvent::HealthChanged { fraction: 0.25 },
            GameEvent::ReloadProgress { fraction: 1.0 },
            GameEvent::ShipCountChanged { count: 4 },
        ]);
        assert_eq!(*recorder.0.borrow(), vec!["health 0.25", "ships 4"]);
    }

    #[test]
    fn test_service_failures_are_swallowed() {
        let mut hooks = Hooks::new().with_platform(Offline);
        hooks.dispatch(&[
            GameEvent::EnemySunk { id: 1, rammed: false },
            GameEvent::EnemySunk { id: 2, rammed: true },
            GameEvent::PlayerSunk { rammed: false },
        ]);
        assert_eq!(hooks.service_failures(), 2);
    }

    #[test]
    fn test_settle_writes_deltas() {
        let mut hooks = Hooks::new().with_persistence(MemoryStore::new(ProgressRecord::new()));
        hooks.settle(&Settlement {
            gold: 250,
            score: 12,
            ships_sunk: 2,
            cleared_level: Some(1),
        });
        let record = hooks.progress();
        assert_eq!(record.player_gold, 250);
        assert_eq!(record.high_score, 12);
        assert_eq!(record.lifetime_ships_sunk, 2);
        assert_eq!(record.highest_level, 1);
    }
}
