//! Per-tick update dispatch
//!
//! Entities are updated in registration order. Each one is asked whether it
//! is active before its update runs, and a failing update is logged and
//! skipped so the rest of the tick still happens. Ordering carries no
//! meaning: cross-entity effects are resolved by the caller after dispatch.

use crate::error::EntityFault;

/// Something the scheduler can tick
pub trait Updatable<C> {
    /// Polled every tick before `update`; false skips the entity this tick
    fn is_active(&self, ctx: &C) -> bool;

    /// Advance one tick
    fn update(&mut self, ctx: &mut C) -> Result<(), EntityFault>;
}

/// Outcome counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub updated: usize,
    pub skipped: usize,
    pub faulted: usize,
}

/// Registration-ordered entity list with fault isolation
#[derive(Debug, Clone)]
pub struct UpdateScheduler<T> {
    entities: Vec<T>,
    total_faults: u64,
}

impl<T> Default for UpdateScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UpdateScheduler<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            total_faults: 0,
        }
    }

    /// Add an entity; returns its index
    pub fn register(&mut self, entity: T) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entities.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entities.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.entities.iter_mut()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.entities
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Faults seen since creation
    pub fn total_faults(&self) -> u64 {
        self.total_faults
    }

    /// Run one tick over every registered entity
    pub fn tick<C>(&mut self, ctx: &mut C) -> TickReport
    where
        T: Updatable<C>,
    {
        let mut report = TickReport::default();
        for (index, entity) in self.entities.iter_mut().enumerate() {
            if !entity.is_active(ctx) {
                report.skipped += 1;
                continue;
            }
            match entity.update(ctx) {
                Ok(()) => report.updated += 1,
                Err(fault) => {
                    log::warn!("update of entity #{} failed: {}", index, fault);
                    report.faulted += 1;
                }
            }
        }
        self.total_faults += report.faulted as u64;
        report
    }
}
