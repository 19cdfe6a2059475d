//! Collision primitives for the top-down course
//!
//! Everything on the course collides as an axis-aligned box: hulls, obstacles
//! and the placement footprints the map generators reserve. Cannonballs are
//! small circles tested against those boxes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Strict overlap test (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x < reach.x && d.y < reach.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }

    /// Same box moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            center: self.center + offset,
            half_extents: self.half_extents,
        }
    }
}

/// Does a circle touch a box?
pub fn circle_aabb_overlap(center: Vec2, radius: f32, aabb: &Aabb) -> bool {
    let closest = center.clamp(aabb.min(), aabb.max());
    (center - closest).length_squared() <= radius * radius
}

/// Unit direction from `from` toward `to`, used to classify impacts
pub fn contact_normal(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// How a ramming contact struck the player's hull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    /// Bow-first into something: the ship is lost
    HeadOn,
    /// Struck from the side: knocked away and damaged
    Side,
    /// Oblique contact: damaged
    Glancing,
    /// Contact from directly astern: no effect
    Astern,
}

/// Classify a contact from the unit normal pointing at the other body
pub fn classify_impact(normal: Vec2, head_on_allowed: bool) -> Impact {
    if normal.x >= 0.9 && head_on_allowed {
        Impact::HeadOn
    } else if normal.y.abs() >= 0.5 {
        Impact::Side
    } else if normal.x >= -0.9 {
        Impact::Glancing
    } else {
        Impact::Astern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(2.0, 1.0));
        let b = Aabb::new(Vec2::new(3.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        // Touching edges do not overlap
        let c = Aabb::new(Vec2::new(4.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(!a.overlaps(&c));

        let d = Aabb::new(Vec2::new(0.0, 5.0), Vec2::new(2.0, 1.0));
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_circle_aabb() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(2.0, 1.0));
        assert!(circle_aabb_overlap(Vec2::new(2.4, 0.0), 0.5, &a));
        assert!(!circle_aabb_overlap(Vec2::new(2.6, 0.0), 0.5, &a));
        assert!(circle_aabb_overlap(Vec2::ZERO, 0.1, &a));
    }

    #[test]
    fn test_classify_impact() {
        assert_eq!(classify_impact(Vec2::X, true), Impact::HeadOn);
        // Head-on with ship damage disabled degrades to a glancing hit
        assert_eq!(classify_impact(Vec2::X, false), Impact::Glancing);
        assert_eq!(classify_impact(Vec2::Y, true), Impact::Side);
        assert_eq!(classify_impact(-Vec2::Y, true), Impact::Side);
        assert_eq!(classify_impact(Vec2::new(0.6, 0.3).normalize(), true), Impact::Glancing);
        assert_eq!(classify_impact(-Vec2::X, true), Impact::Astern);
    }

    #[test]
    fn test_contact_normal() {
        let n = contact_normal(Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert_eq!(n, Vec2::X);
        assert_eq!(contact_normal(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }
}
