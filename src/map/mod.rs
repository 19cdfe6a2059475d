//! Procedural sea maps
//!
//! Two generators share the types in this module:
//! - `classic`: a finite, seeded course per level ending at an island
//! - `endless`: a ring of blocks recycled ahead of the player forever
//!
//! Both place enemies and obstacles through `placement`, which never lets
//! footprints overlap inside a block.

pub mod classic;
pub mod endless;
pub mod placement;

pub use classic::{
    ClassicLayout, ClassicMapGenerator, ClassicParams, EnemySpawn, Island, generate_classic_map,
};
pub use endless::{EndlessBlock, EndlessMap, ObstacleSlot};
pub use placement::{
    CHANNEL_MARGIN, MAX_PLACEMENT_ATTEMPTS, PLACEMENT_CLEARANCE, PlacementMethod, SpawnArea,
    place_clear,
};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{SHIP_HALF_BEAM, SHIP_HALF_LENGTH};
use crate::sim::collision::Aabb;

/// Length of one terrain block along the course
pub const TERRAIN_LENGTH: f32 = 100.0;
/// x of the first block
pub const ORIGIN_X: f32 = -25.0;

/// Block-relative spawn window (integer grid)
pub const SPAWN_MIN_X: i32 = -12;
pub const SPAWN_MAX_X: i32 = 60;
pub const SPAWN_MIN_Y: i32 = -30;
pub const SPAWN_MAX_Y: i32 = 30;

pub const RIVER_VARIANTS: u8 = 3;
/// Open water either side of the lane center, per river variant
pub const RIVER_CHANNEL_HALF_WIDTHS: [f32; RIVER_VARIANTS as usize] = [20.0, 16.0, 13.0];
/// How far a bank reaches away from its channel
pub const BANK_HALF_DEPTH: f32 = 20.0;
pub const ISLAND_VARIANTS: u8 = 3;

/// Footprint reserved for an enemy ship
pub const ENEMY_HALF_EXTENTS: Vec2 = Vec2::new(SHIP_HALF_LENGTH, SHIP_HALF_BEAM);

/// Terrain piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainKind {
    Ocean,
    River { variant: u8 },
}

impl TerrainKind {
    /// Half width of navigable water, `None` for open ocean
    pub fn channel_half_width(&self) -> Option<f32> {
        match self {
            TerrainKind::Ocean => None,
            TerrainKind::River { variant } => {
                let index = (*variant as usize).min(RIVER_CHANNEL_HALF_WIDTHS.len() - 1);
                Some(RIVER_CHANNEL_HALF_WIDTHS[index])
            }
        }
    }
}

/// Which shore of a river a bank lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankSide {
    /// Toward -y
    South,
    /// Toward +y
    North,
}

/// One terrain block laid along the course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBlock {
    pub kind: TerrainKind,
    pub position: Vec2,
}

impl MapBlock {
    pub fn ocean(x: f32) -> Self {
        Self {
            kind: TerrainKind::Ocean,
            position: Vec2::new(x, 0.0),
        }
    }

    /// Solid banks either side of a river's channel. The block spans
    /// `TERRAIN_LENGTH` forward of its position.
    pub fn banks(&self) -> Option<[(BankSide, Aabb); 2]> {
        let channel = self.kind.channel_half_width()?;
        let half_extents = Vec2::new(TERRAIN_LENGTH / 2.0, BANK_HALF_DEPTH);
        let center = self.position + Vec2::new(TERRAIN_LENGTH / 2.0, 0.0);
        let reach = Vec2::new(0.0, channel + BANK_HALF_DEPTH);
        Some([
            (BankSide::South, Aabb::new(center - reach, half_extents)),
            (BankSide::North, Aabb::new(center + reach, half_extents)),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Rock,
    Reef,
    Wreck,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] =
        [ObstacleKind::Rock, ObstacleKind::Reef, ObstacleKind::Wreck];

    pub fn half_extents(&self) -> Vec2 {
        match self {
            ObstacleKind::Rock => Vec2::new(4.0, 4.0),
            ObstacleKind::Reef => Vec2::new(6.0, 3.0),
            ObstacleKind::Wreck => Vec2::new(8.0, 4.0),
        }
    }

    /// Uniformly pick a kind
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A placed obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Index of the block it was placed in
    pub block: usize,
    pub position: Vec2,
    pub method: PlacementMethod,
}

impl Obstacle {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, self.kind.half_extents())
    }
}

/// Footprint of an enemy ship standing at `position`
pub fn enemy_footprint(position: Vec2) -> Aabb {
    Aabb::new(position, ENEMY_HALF_EXTENTS)
}
