//! Overlap-free placement
//!
//! Candidates are drawn on an integer grid inside a [`SpawnArea`] until one
//! clears every occupied footprint. Sampling is capped; after the cap a
//! deterministic scan of grid cells takes over, and if even that finds nothing
//! the last sample is used anyway and logged. Placement never fails.
//!
//! Accepted footprints keep [`PLACEMENT_CLEARANCE`] from everything already
//! placed, so blocks can be moved by fractional distances without edges that
//! merely touched turning into overlaps.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{SPAWN_MAX_X, SPAWN_MAX_Y, SPAWN_MIN_X, SPAWN_MIN_Y, TerrainKind};
use crate::sim::collision::Aabb;

/// Random samples tried before falling back to the grid scan
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 32;
/// Minimum gap between an accepted footprint and any occupied one
pub const PLACEMENT_CLEARANCE: f32 = 0.5;
/// Water kept between a spawn position and a river bank; covers the largest
/// footprint's half height plus clearance
pub const CHANNEL_MARGIN: f32 = 5.0;

/// How a position was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementMethod {
    Sampled,
    /// Found by the grid scan
    Fallback,
    /// Nothing was clear; may overlap
    Forced,
}

/// Half-open integer window `[min, max)` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl SpawnArea {
    /// Window of block `index` in course coordinates
    pub fn for_block(index: usize) -> Self {
        let shift = index as i32 * 100;
        Self {
            min_x: SPAWN_MIN_X + shift,
            max_x: SPAWN_MAX_X + shift,
            min_y: SPAWN_MIN_Y,
            max_y: SPAWN_MAX_Y,
        }
    }

    /// Window of block `index`, kept inside the channel when it is a river
    pub fn for_terrain(index: usize, kind: TerrainKind) -> Self {
        Self::for_block(index).within_channel(kind.channel_half_width())
    }

    /// Narrow the y range to `half_width - CHANNEL_MARGIN` either side of the
    /// lane center
    pub fn within_channel(self, half_width: Option<f32>) -> Self {
        let Some(half_width) = half_width else {
            return self;
        };
        let reach = (half_width - CHANNEL_MARGIN).floor().max(0.0) as i32;
        let min_y = self.min_y.max(-reach);
        Self {
            min_y,
            max_y: self.max_y.min(reach).max(min_y + 1),
            ..self
        }
    }

    /// Nearest point of the window to `p`
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min_x as f32, (self.max_x - 1).max(self.min_x) as f32),
            p.y.clamp(self.min_y as f32, (self.max_y - 1).max(self.min_y) as f32),
        )
    }

    /// Window relative to a block's own position
    pub fn block_local() -> Self {
        // Block 0 starts at x = -25
        Self {
            min_x: SPAWN_MIN_X + 25,
            max_x: SPAWN_MAX_X + 25,
            min_y: SPAWN_MIN_Y,
            max_y: SPAWN_MAX_Y,
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec2 {
        let x = rng.random_range(self.min_x..self.max_x.max(self.min_x + 1));
        let y = rng.random_range(self.min_y..self.max_y.max(self.min_y + 1));
        Vec2::new(x as f32, y as f32)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x as f32
            && p.x < self.max_x as f32
            && p.y >= self.min_y as f32
            && p.y < self.max_y as f32
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) as f32 / 2.0,
            (self.min_y + self.max_y) as f32 / 2.0,
        )
        .floor()
    }
}

fn is_clear(candidate: &Aabb, occupied: &[Aabb]) -> bool {
    !occupied.iter().any(|o| o.overlaps(candidate))
}

/// Find a position in `area` whose footprint clears `occupied`
pub fn place_clear(
    rng: &mut impl Rng,
    area: &SpawnArea,
    half_extents: Vec2,
    occupied: &[Aabb],
) -> (Vec2, PlacementMethod) {
    let padded = half_extents.abs() + Vec2::splat(PLACEMENT_CLEARANCE);
    let mut last = area.center();
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = area.sample(rng);
        last = candidate;
        if is_clear(&Aabb::new(candidate, padded), occupied) {
            return (candidate, PlacementMethod::Sampled);
        }
    }

    // Scan cells one footprint apart, row by row
    let step_x = (half_extents.x * 2.0).ceil().max(1.0) as i32;
    let step_y = (half_extents.y * 2.0).ceil().max(1.0) as i32;
    let mut y = area.min_y;
    while y < area.max_y {
        let mut x = area.min_x;
        while x < area.max_x {
            let candidate = Vec2::new(x as f32, y as f32);
            if is_clear(&Aabb::new(candidate, padded), occupied) {
                return (candidate, PlacementMethod::Fallback);
            }
            x += step_x;
        }
        y += step_y;
    }

    log::warn!(
        "No clear spot in x[{}, {}) y[{}, {}) for {} occupied footprints, placing at ({}, {})",
        area.min_x,
        area.max_x,
        area.min_y,
        area.max_y,
        occupied.len(),
        last.x,
        last.y
    );
    (last, PlacementMethod::Forced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_samples_stay_in_area() {
        let mut rng = Pcg32::seed_from_u64(3);
        let area = SpawnArea::for_block(2);
        for _ in 0..500 {
            let p = area.sample(&mut rng);
            assert!(area.contains(p), "{p}");
            assert_eq!(p, p.round());
        }
    }

    #[test]
    fn test_empty_area_samples_first_try() {
        let mut rng = Pcg32::seed_from_u64(1);
        let (p, method) = place_clear(&mut rng, &SpawnArea::for_block(1), Vec2::splat(4.0), &[]);
        assert_eq!(method, PlacementMethod::Sampled);
        assert!(SpawnArea::for_block(1).contains(p));
    }

    #[test]
    fn test_fallback_scan_finds_the_gap() {
        let area = SpawnArea {
            min_x: 0,
            max_x: 40,
            min_y: 0,
            max_y: 10,
        };
        // Everything blocked except a pocket around x = 36
        let occupied = [Aabb::new(Vec2::new(10.0, 5.0), Vec2::new(20.0, 20.0))];
        let mut rng = Pcg32::seed_from_u64(9);
        let (p, method) = place_clear(&mut rng, &area, Vec2::splat(2.0), &occupied);
        assert_ne!(method, PlacementMethod::Forced);
        assert!(!occupied[0].overlaps(&Aabb::new(p, Vec2::splat(2.0))));
    }

    #[test]
    fn test_touching_edges_are_rejected() {
        // Only x = 0 and x = 1 fit; x = 0 would touch the occupied box
        let area = SpawnArea {
            min_x: 0,
            max_x: 2,
            min_y: 0,
            max_y: 1,
        };
        let occupied = [Aabb::new(Vec2::new(-4.0, 0.0), Vec2::splat(2.0))];
        let mut rng = Pcg32::seed_from_u64(4);
        let (p, method) = place_clear(&mut rng, &area, Vec2::splat(2.0), &occupied);
        assert_ne!(method, PlacementMethod::Forced);
        assert_eq!(p, Vec2::new(1.0, 0.0));

        // Still clear once both boxes sit at fractional positions
        let shift = Vec2::new(-7.2494, 0.0);
        let placed = Aabb::new(p + shift, Vec2::splat(2.0));
        assert!(!occupied[0].translated(shift).overlaps(&placed));
    }

    #[test]
    fn test_river_window_stays_off_the_banks() {
        let ocean = SpawnArea::for_terrain(1, TerrainKind::Ocean);
        assert_eq!(ocean, SpawnArea::for_block(1));

        let river = SpawnArea::for_terrain(1, TerrainKind::River { variant: 2 });
        assert_eq!((river.min_x, river.max_x), (ocean.min_x, ocean.max_x));
        assert_eq!((river.min_y, river.max_y), (-8, 8));

        // Largest obstacle at the window edge still clears a 13 wide channel
        let mut rng = Pcg32::seed_from_u64(21);
        for _ in 0..200 {
            let p = river.sample(&mut rng);
            assert!(p.y.abs() + 4.0 < 13.0, "{p}");
        }
        assert_eq!(river.clamp_point(Vec2::new(150.0, -30.0)), Vec2::new(150.0, -8.0));
        assert_eq!(ocean.clamp_point(Vec2::new(150.0, -30.0)), Vec2::new(150.0, -30.0));
    }

    #[test]
    fn test_forced_when_full() {
        let area = SpawnArea::for_block(0);
        let occupied = [Aabb::new(Vec2::ZERO, Vec2::splat(500.0))];
        let mut rng = Pcg32::seed_from_u64(9);
        let (p, method) = place_clear(&mut rng, &area, Vec2::splat(2.0), &occupied);
        assert_eq!(method, PlacementMethod::Forced);
        assert!(area.contains(p));
    }
}
