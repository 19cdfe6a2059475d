//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (registration order, player first)
//! - No rendering or platform dependencies

pub mod cannonball;
pub mod collision;
pub mod scheduler;
pub mod ship;
pub mod state;
pub mod stats;
pub mod tick;

pub use cannonball::{Cannonball, Faction, ProjectilePool};
pub use collision::{Aabb, Impact};
pub use scheduler::{TickReport, Updatable, UpdateScheduler};
pub use ship::{Behavior, CombatEntity, ShipState};
pub use state::{Battle, Course, GameEvent, GameFlags, GameMode, Outcome};
pub use stats::{StatSource, Stats};
pub use tick::{TickInput, tick};
