//! Cannonballs and the per-ship projectile pool
//!
//! Every ship owns a fixed set of cannonballs. A cannonball is either waiting
//! in the ship's FIFO queue or in flight; it returns to the same ship's queue
//! when it hits something or outlives the flight-time bound. The pool never
//! shares projectiles across ships.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Who fired a projectile (prevents self-hits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// A pooled cannonball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cannonball {
    /// Slot index inside the owning pool
    pub slot: usize,
    pub damage: f32,
    pub faction: Faction,
    /// Seconds since firing, reset to 0 on every return to the pool
    pub uptime: f32,
    pub pos: Vec2,
    /// Unit travel direction
    pub heading: Vec2,
    pub in_flight: bool,
}

impl Cannonball {
    fn new(slot: usize, faction: Faction) -> Self {
        Self {
            slot,
            damage: 0.0,
            faction,
            uptime: 0.0,
            pos: Vec2::ZERO,
            heading: Vec2::X,
            in_flight: false,
        }
    }
}

/// Fixed-capacity FIFO pool owned by one ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectilePool {
    faction: Faction,
    speed: f32,
    lifetime: f32,
    slots: Vec<Cannonball>,
    ready: VecDeque<usize>,
}

impl ProjectilePool {
    pub fn new(faction: Faction, capacity: usize, speed: f32, lifetime: f32) -> Self {
        let mut pool = Self {
            faction,
            speed,
            lifetime,
            slots: Vec::with_capacity(capacity),
            ready: VecDeque::with_capacity(capacity),
        };
        pool.grow_to(capacity);
        pool
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Cannonballs waiting in the queue
    pub fn available(&self) -> usize {
        self.ready.len()
    }

    pub fn in_flight(&self) -> usize {
        self.slots.len() - self.ready.len()
    }

    /// Add slots until the pool holds `capacity` cannonballs (never shrinks)
    pub fn grow_to(&mut self, capacity: usize) {
        for slot in self.slots.len()..capacity {
            self.slots.push(Cannonball::new(slot, self.faction));
            self.ready.push_back(slot);
        }
    }

    /// Launch one cannonball; `None` when the queue is empty
    pub fn fire(&mut self, origin: Vec2, heading: Vec2, damage: f32) -> Option<usize> {
        let slot = self.ready.pop_front()?;
        let ball = &mut self.slots[slot];
        ball.in_flight = true;
        ball.uptime = 0.0;
        ball.damage = damage;
        ball.pos = origin;
        ball.heading = heading.normalize_or(Vec2::X);
        Some(slot)
    }

    /// Return a cannonball to the queue; false if it was not in flight
    pub fn retire(&mut self, slot: usize) -> bool {
        let Some(ball) = self.slots.get_mut(slot) else {
            return false;
        };
        if !ball.in_flight {
            return false;
        }
        ball.in_flight = false;
        ball.uptime = 0.0;
        self.ready.push_back(slot);
        true
    }

    /// Move every in-flight cannonball one tick; retire the ones past the
    /// flight-time bound. Returns how many were retired.
    pub fn advance(&mut self, dt: f32) -> usize {
        let mut expired = Vec::new();
        for ball in self.slots.iter_mut().filter(|b| b.in_flight) {
            if ball.uptime > self.lifetime {
                expired.push(ball.slot);
            } else {
                ball.pos += ball.heading * self.speed * dt;
                ball.uptime += dt;
            }
        }
        for slot in &expired {
            self.retire(*slot);
        }
        expired.len()
    }

    /// Retire everything in flight
    pub fn recall_all(&mut self) {
        let flying: Vec<usize> = self.in_flight_iter().map(|b| b.slot).collect();
        for slot in flying {
            self.retire(slot);
        }
    }

    pub fn in_flight_iter(&self) -> impl Iterator<Item = &Cannonball> {
        self.slots.iter().filter(|b| b.in_flight)
    }

    pub fn get(&self, slot: usize) -> Option<&Cannonball> {
        self.slots.get(slot)
    }
}
