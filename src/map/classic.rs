//! Classic level layouts
//!
//! A level number fully determines its course: the generator seeds its RNG
//! with the level, so the same level always yields the same blocks, enemies
//! and obstacles. The course is a shuffled run of ocean and river blocks, four
//! plain ocean blocks, and the island that ends the level.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::placement::{SpawnArea, place_clear};
use super::{
    BankSide, ISLAND_VARIANTS, MapBlock, ORIGIN_X, Obstacle, ObstacleKind, RIVER_VARIANTS,
    TERRAIN_LENGTH, TerrainKind, enemy_footprint,
};
use crate::sim::collision::Aabb;

/// Ocean blocks appended after the shuffled run
const TAIL_OCEAN_BLOCKS: usize = 4;
/// Trailing blocks kept clear of enemies and obstacles
const RESERVED_TAIL: usize = 2;
/// Fixed spawn of the tutorial ship
const TUTORIAL_SHIP: Vec2 = Vec2::new(150.0, -30.0);
/// The tutorial keeps its first blocks free of obstacles
const TUTORIAL_FIRST_OBSTACLE_BLOCK: usize = 3;
/// The island spans the whole course width
pub const ISLAND_HALF_EXTENTS: Vec2 = Vec2::new(20.0, 60.0);

/// Counts derived from a level
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassicParams {
    pub level: i32,
    pub terrain_blocks: u32,
    pub enemy_ships: u32,
    pub obstacles: u32,
    /// Share of the shuffled run that is ocean, in [0, 1)
    pub ocean_ratio: f32,
}

impl ClassicParams {
    /// Derive counts for `level`, drawing from the level's RNG
    pub fn for_level(level: i32, rng: &mut impl Rng) -> Self {
        let level = level.max(0);
        let tens = (level as u32).div_ceil(10);
        let terrain_blocks = if level == 0 { 2 } else { tens };
        let low = terrain_blocks.div_ceil(2);
        let pairs = if low < terrain_blocks {
            rng.random_range(low..terrain_blocks)
        } else {
            low
        };
        Self {
            level,
            terrain_blocks,
            enemy_ships: 1 + tens,
            obstacles: pairs * 2,
            ocean_ratio: rng.random::<f32>(),
        }
    }
}

/// The goal at the end of a course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Island {
    pub variant: u8,
    pub position: Vec2,
}

impl Island {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, ISLAND_HALF_EXTENTS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub block: usize,
    pub position: Vec2,
}

impl EnemySpawn {
    pub fn aabb(&self) -> Aabb {
        enemy_footprint(self.position)
    }
}

/// A generated course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicLayout {
    pub params: ClassicParams,
    pub blocks: Vec<MapBlock>,
    pub island: Island,
    pub enemies: Vec<EnemySpawn>,
    pub obstacles: Vec<Obstacle>,
    /// Ships actually placed (may be fewer than `params.enemy_ships`)
    pub ships_spawned: u32,
}

impl ClassicLayout {
    pub fn level(&self) -> i32 {
        self.params.level
    }

    /// Move the whole course along x
    pub fn scroll(&mut self, dx: f32) {
        let shift = Vec2::new(dx, 0.0);
        for block in &mut self.blocks {
            block.position += shift;
        }
        self.island.position += shift;
        for enemy in &mut self.enemies {
            enemy.position += shift;
        }
        for obstacle in &mut self.obstacles {
            obstacle.position += shift;
        }
    }

    /// River banks along the whole course
    pub fn banks(&self) -> impl Iterator<Item = (BankSide, Aabb)> + '_ {
        self.blocks.iter().flat_map(|block| block.banks().into_iter().flatten())
    }

    /// Spawn window of block `index`, inside its channel if it has one
    fn spawn_area(&self, index: usize) -> SpawnArea {
        match self.blocks.get(index) {
            Some(block) => SpawnArea::for_terrain(index, block.kind),
            None => SpawnArea::for_block(index),
        }
    }

    /// Footprints placed in block `index`
    fn occupied_in(&self, index: usize) -> Vec<Aabb> {
        self.enemies
            .iter()
            .filter(|e| e.block == index)
            .map(EnemySpawn::aabb)
            .chain(self.obstacles.iter().filter(|o| o.block == index).map(Obstacle::aabb))
            .collect()
    }
}

/// Generate the course for `level`
pub fn generate_classic_map(level: i32) -> ClassicLayout {
    let mut rng = level_rng(level);
    let params = ClassicParams::for_level(level, &mut rng);
    build_layout(params, &mut rng)
}

fn level_rng(level: i32) -> Pcg32 {
    Pcg32::seed_from_u64(level.max(0) as u64)
}

fn build_layout(params: ClassicParams, rng: &mut Pcg32) -> ClassicLayout {
    let blocks = spawn_terrain(&params, rng);
    let island = Island {
        variant: rng.random_range(0..ISLAND_VARIANTS),
        position: Vec2::new(
            ORIGIN_X + blocks.len() as f32 * TERRAIN_LENGTH - TERRAIN_LENGTH - 50.0,
            0.0,
        ),
    };
    let mut layout = ClassicLayout {
        params,
        blocks,
        island,
        enemies: Vec::new(),
        obstacles: Vec::new(),
        ships_spawned: 0,
    };
    spawn_enemies(&mut layout, rng);
    spawn_obstacles(&mut layout, rng);

    log::info!(
        "Generated classic level {}: {} blocks, {}/{} ships, {}/{} obstacles",
        params.level,
        layout.blocks.len(),
        layout.ships_spawned,
        params.enemy_ships,
        layout.obstacles.len(),
        params.obstacles
    );
    layout
}

fn spawn_terrain(params: &ClassicParams, rng: &mut Pcg32) -> Vec<MapBlock> {
    let count = params.terrain_blocks as usize;
    let oceans = ((params.ocean_ratio * count as f32).round() as usize).min(count);

    let mut bag: Vec<TerrainKind> = Vec::with_capacity(count);
    bag.extend(std::iter::repeat_n(TerrainKind::Ocean, oceans));
    for _ in oceans..count {
        bag.push(TerrainKind::River {
            variant: rng.random_range(0..RIVER_VARIANTS),
        });
    }
    bag.shuffle(rng);

    bag.into_iter()
        .chain(std::iter::repeat_n(TerrainKind::Ocean, TAIL_OCEAN_BLOCKS))
        .enumerate()
        .map(|(i, kind)| MapBlock {
            kind,
            position: Vec2::new(ORIGIN_X + i as f32 * TERRAIN_LENGTH, 0.0),
        })
        .collect()
}

fn spawn_enemies(layout: &mut ClassicLayout, rng: &mut Pcg32) {
    let last = layout.blocks.len().saturating_sub(RESERVED_TAIL);
    let mut remaining = layout.params.enemy_ships as usize;

    for i in 1..last {
        if remaining == 0 {
            break;
        }
        // Leave some blocks empty while there is room to spare
        if remaining < last - i && rng.random_range(0..10) == 0 {
            continue;
        }
        let area = layout.spawn_area(i);
        let position = if layout.params.level == 0 {
            area.clamp_point(TUTORIAL_SHIP)
        } else {
            area.sample(rng)
        };
        layout.enemies.push(EnemySpawn { block: i, position });
        layout.ships_spawned += 1;
        remaining -= 1;
    }
}

fn spawn_obstacles(layout: &mut ClassicLayout, rng: &mut Pcg32) {
    let last = layout.blocks.len().saturating_sub(RESERVED_TAIL);
    let first = if layout.params.level == 0 {
        TUTORIAL_FIRST_OBSTACLE_BLOCK
    } else {
        1
    };
    let mut remaining = layout.params.obstacles as usize;

    'blocks: for i in first..last {
        for j in 0..2 {
            if remaining == 0 {
                break 'blocks;
            }
            let slots_left = (last - i) * 2 - j;
            if remaining < slots_left && rng.random_range(0..3) == 0 {
                continue;
            }
            let kind = ObstacleKind::random(rng);
            let occupied = layout.occupied_in(i);
            let area = layout.spawn_area(i);
            let (position, method) = place_clear(rng, &area, kind.half_extents(), &occupied);
            layout.obstacles.push(Obstacle {
                kind,
                block: i,
                position,
                method,
            });
            remaining -= 1;
        }
    }
}

/// Stateful generator holding the current parameters and layout
#[derive(Debug, Clone, Default)]
pub struct ClassicMapGenerator {
    params: ClassicParams,
    layout: Option<ClassicLayout>,
}

impl ClassicMapGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &ClassicParams {
        &self.params
    }

    pub fn layout(&self) -> Option<&ClassicLayout> {
        self.layout.as_ref()
    }

    /// Derive parameters from `level` and generate its course
    pub fn generate_for_level(&mut self, level: i32) -> &ClassicLayout {
        let layout = generate_classic_map(level);
        self.params = layout.params;
        self.layout.insert(layout)
    }

    /// Regenerate from the current parameters
    pub fn generate(&mut self) -> &ClassicLayout {
        let mut rng = level_rng(self.params.level);
        self.layout.insert(build_layout(self.params, &mut rng))
    }

    /// Drop the current layout. A complete clear also zeroes the parameters
    /// and regenerates from them.
    pub fn clear_map(&mut self, complete: bool) {
        if self.layout.take().is_none() {
            return;
        }
        if complete {
            self.params = ClassicParams::default();
            self.generate();
        }
    }
}
