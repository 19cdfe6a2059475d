//! Endless terrain ring
//!
//! A fixed number of ocean blocks scroll toward the player. When a block
//! falls behind the recycle line it is moved to the front of the ring and its
//! enemy and obstacle slots are rolled again for the current difficulty.
//! Nothing is ever allocated after start.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::placement::{PlacementMethod, SpawnArea, place_clear};
use super::{ENEMY_HALF_EXTENTS, MapBlock, ORIGIN_X, ObstacleKind, TERRAIN_LENGTH};
use crate::consts::DISTANCE_TO_INCREASE_LEVEL;
use crate::sim::collision::Aabb;

/// Blocks alive at any time
pub const TERRAIN_BLOCKS_TO_SPAWN: usize = 3;
/// Blocks whose x drops below this are recycled
pub const RECYCLE_X: f32 = -125.0;
/// Recycled blocks overlap their neighbour slightly to hide the seam
pub const RELOCATION_OVERLAP: f32 = 0.3;
/// Chance out of 5 that an obstacle slot stays empty
const EMPTY_OBSTACLE_ODDS: u32 = 5;

/// Obstacle slot inside a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSlot {
    pub kind: ObstacleKind,
    /// Offset from the block position
    pub offset: Vec2,
    pub active: bool,
    pub method: PlacementMethod,
}

/// One ring entry: a block, its enemy slot and two obstacle slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndlessBlock {
    pub block: MapBlock,
    /// Enemy offset from the block position
    pub enemy_offset: Vec2,
    pub enemy_active: bool,
    pub obstacles: [ObstacleSlot; 2],
    /// Times this block has been recycled
    pub generation: u32,
}

impl EndlessBlock {
    pub fn enemy_position(&self) -> Vec2 {
        self.block.position + self.enemy_offset
    }

    pub fn obstacle_position(&self, slot: usize) -> Option<Vec2> {
        self.obstacles
            .get(slot)
            .map(|o| self.block.position + o.offset)
    }

    /// Footprints of the active obstacles, in course coordinates
    pub fn active_obstacles(&self) -> impl Iterator<Item = (ObstacleKind, Aabb)> + '_ {
        self.obstacles
            .iter()
            .filter(|o| o.active)
            .map(|o| (o.kind, Aabb::new(self.block.position + o.offset, o.kind.half_extents())))
    }
}

/// The ring plus distance and difficulty tracking
#[derive(Debug, Clone)]
pub struct EndlessMap {
    blocks: Vec<EndlessBlock>,
    level: i32,
    /// Distance since the last level increase
    distance: f32,
    total_distance: f32,
    distance_per_level: f32,
    recycled: u64,
    rng: Pcg32,
}

impl EndlessMap {
    /// Lay out the starting ring. Block 0 starts empty.
    pub fn new(seed: u64, start_level: i32) -> Self {
        Self::with_distance_per_level(seed, start_level, DISTANCE_TO_INCREASE_LEVEL)
    }

    pub fn with_distance_per_level(seed: u64, start_level: i32, distance_per_level: f32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let blocks = (0..TERRAIN_BLOCKS_TO_SPAWN)
            .map(|i| {
                let block = MapBlock::ocean(ORIGIN_X + i as f32 * TERRAIN_LENGTH);
                let mut entry = roll_contents(block, &mut rng);
                if i == 0 {
                    entry.enemy_active = false;
                    for slot in &mut entry.obstacles {
                        slot.active = false;
                    }
                }
                entry
            })
            .collect();
        log::info!(
            "Endless map started at level {} with {} blocks",
            start_level,
            TERRAIN_BLOCKS_TO_SPAWN
        );
        Self {
            blocks,
            level: start_level,
            distance: 0.0,
            total_distance: 0.0,
            distance_per_level: distance_per_level.max(f32::EPSILON),
            recycled: 0,
            rng,
        }
    }

    pub fn blocks(&self) -> &[EndlessBlock] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&EndlessBlock> {
        self.blocks.get(index)
    }

    /// Current difficulty level
    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    pub fn recycled_count(&self) -> u64 {
        self.recycled
    }

    /// x of the block furthest ahead
    pub fn furthest_x(&self) -> f32 {
        self.blocks
            .iter()
            .map(|b| b.block.position.x)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Move the ring `distance` toward the player. Returns the indices of
    /// blocks that were recycled, in recycle order.
    pub fn scroll(&mut self, distance: f32) -> Vec<usize> {
        let distance = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
        for entry in &mut self.blocks {
            entry.block.position.x -= distance;
        }

        self.total_distance += distance;
        self.distance += distance;
        while self.distance > self.distance_per_level {
            self.distance -= self.distance_per_level;
            self.level += 1;
            log::info!("Endless difficulty raised to level {}", self.level);
        }

        let mut recycled = Vec::new();
        // Rear-most first so relocations chain in order
        let mut behind: Vec<usize> = (0..self.blocks.len())
            .filter(|&i| self.blocks[i].block.position.x < RECYCLE_X)
            .collect();
        behind.sort_by(|&a, &b| {
            self.blocks[a]
                .block
                .position
                .x
                .total_cmp(&self.blocks[b].block.position.x)
        });
        for index in behind {
            self.recycle(index);
            recycled.push(index);
        }
        recycled
    }

    /// Move block `index` to the front of the ring and roll new contents
    ///
    /// The front is never placed behind the recycle line, so a block is
    /// recycled at most once per scroll however far the ring moved.
    pub fn recycle(&mut self, index: usize) {
        if index >= self.blocks.len() {
            return;
        }
        let front = self.furthest_x().max(RECYCLE_X) + TERRAIN_LENGTH - RELOCATION_OVERLAP;
        let mut block = self.blocks[index].block;
        block.position.x = front;

        let generation = self.blocks[index].generation + 1;
        let mut entry = roll_contents(block, &mut self.rng);
        entry.generation = generation;
        self.blocks[index] = entry;
        self.recycled += 1;
        log::debug!(
            "Recycled endless block {} to x = {} (level {})",
            index,
            front,
            self.level
        );
    }
}

/// Roll an enemy offset and two obstacle slots for a block
fn roll_contents(block: MapBlock, rng: &mut Pcg32) -> EndlessBlock {
    let area = SpawnArea::block_local();
    let enemy_offset = area.sample(rng);
    let mut occupied = vec![Aabb::new(enemy_offset, ENEMY_HALF_EXTENTS)];

    let obstacles = std::array::from_fn(|_| {
        let kind = ObstacleKind::random(rng);
        let (offset, method) = place_clear(rng, &area, kind.half_extents(), &occupied);
        occupied.push(Aabb::new(offset, kind.half_extents()));
        ObstacleSlot {
            kind,
            offset,
            active: rng.random_range(0..EMPTY_OBSTACLE_ODDS) != 0,
            method,
        }
    });

    EndlessBlock {
        block,
        enemy_offset,
        enemy_active: true,
        obstacles,
        generation: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAP_SPEED, SIM_DT};
    use crate::map::enemy_footprint;
    use proptest::prelude::*;

    #[test]
    fn test_initial_ring() {
        let map = EndlessMap::new(7, 1);
        assert_eq!(map.blocks().len(), TERRAIN_BLOCKS_TO_SPAWN);
        assert_eq!(map.blocks()[0].block.position.x, ORIGIN_X);
        assert_eq!(map.blocks()[2].block.position.x, ORIGIN_X + 200.0);
        assert!(!map.blocks()[0].enemy_active);
        assert!(map.blocks()[0].obstacles.iter().all(|o| !o.active));
        assert!(map.blocks()[1].enemy_active);
        assert_eq!(map.level(), 1);
    }

    #[test]
    fn test_recycle_relocates_to_front() {
        let mut map = EndlessMap::new(7, 1);
        // Block 0 crosses the line after 100+ units
        let recycled = map.scroll(101.0);
        assert_eq!(recycled, vec![0]);
        let front = map.blocks()[0].block.position.x;
        // Block 2 was at 175 before scrolling, 74 after
        assert!((front - (74.0 + TERRAIN_LENGTH - RELOCATION_OVERLAP)).abs() < 1e-3);
        assert!(map.blocks()[0].enemy_active);
        assert_eq!(map.blocks()[0].generation, 1);
        assert_eq!(map.recycled_count(), 1);
    }

    #[test]
    fn test_long_scroll_recycles_everything_ahead() {
        let mut map = EndlessMap::new(7, 1);
        let recycled = map.scroll(400.0);
        assert_eq!(recycled, vec![0, 1, 2]);
        let mut xs: Vec<f32> = map.blocks().iter().map(|b| b.block.position.x).collect();
        xs.sort_by(f32::total_cmp);
        assert!(xs[0] >= RECYCLE_X, "{xs:?}");
        for pair in xs.windows(2) {
            assert!((pair[1] - pair[0] - (TERRAIN_LENGTH - RELOCATION_OVERLAP)).abs() < 1e-3);
        }

        // A non-finite step is ignored
        let before = map.blocks().to_vec();
        assert!(map.scroll(f32::INFINITY).is_empty());
        assert_eq!(map.blocks(), &before[..]);
    }

    #[test]
    fn test_level_rises_with_distance() {
        let mut map = EndlessMap::new(1, 1);
        map.scroll(150.0);
        assert_eq!(map.level(), 1);
        map.scroll(1.0);
        assert_eq!(map.level(), 2);
        map.scroll(450.0);
        assert_eq!(map.level(), 5);
    }

    #[test]
    fn test_same_seed_same_ring() {
        let mut a = EndlessMap::new(99, 3);
        let mut b = EndlessMap::new(99, 3);
        for _ in 0..2000 {
            a.scroll(MAP_SPEED * SIM_DT);
            b.scroll(MAP_SPEED * SIM_DT);
        }
        assert_eq!(a.blocks(), b.blocks());
    }

    proptest! {
        #[test]
        fn prop_ring_stays_bounded(
            seed in any::<u64>(),
            steps in proptest::collection::vec(0.0f32..40.0, 1..300),
        ) {
            let mut map = EndlessMap::new(seed, 1);
            for step in steps {
                map.scroll(step);
                prop_assert_eq!(map.blocks().len(), TERRAIN_BLOCKS_TO_SPAWN);
                for entry in map.blocks() {
                    prop_assert!(entry.block.position.x >= RECYCLE_X);
                    let enemy = enemy_footprint(entry.enemy_position());
                    // Every slot, active or not, was placed clear of the others
                    let obstacles: Vec<Aabb> = (0..entry.obstacles.len())
                        .filter_map(|slot| {
                            let kind = entry.obstacles[slot].kind;
                            entry
                                .obstacle_position(slot)
                                .map(|p| Aabb::new(p, kind.half_extents()))
                        })
                        .collect();
                    for (i, obstacle) in obstacles.iter().enumerate() {
                        prop_assert!(!enemy.overlaps(obstacle));
                        for other in &obstacles[i + 1..] {
                            prop_assert!(!obstacle.overlaps(other));
                        }
                    }
                }
            }
        }
    }
}
