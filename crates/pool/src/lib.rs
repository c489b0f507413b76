//! Slot pools: fixed-capacity allocators over a preallocated backing array.
//!
//! # Invariants
//! - The backing array is split into a given prefix `[0, free_idx)` and a free
//!   suffix `[free_idx, capacity)`; `0 <= free_idx <= capacity` always.
//! - Given ∪ free is a permutation of the items the pool was built with.
//! - Capacity is fixed at construction. Pools never touch GPU memory; callers
//!   mark their own resources dirty.

mod ordered;
mod swap;

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub use ordered::OrderedPool;
pub use swap::SlotPool;

/// Errors from pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool exhausted: all {capacity} items are given out")]
    CapacityExhausted { capacity: usize },
    #[error("item at index {index} was already returned (free_idx={free_idx})")]
    DoubleRelease { index: usize, free_idx: usize },
    #[error("index {index} is out of range for pool of capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },
    #[error("item does not belong to this pool")]
    UnknownItem,
}

/// The pool contract shared by every release strategy.
pub trait Pool<T>: Debug {
    /// Hand out the next free item.
    fn get(&mut self) -> Result<T, PoolError>;

    /// Return a given item, located by a linear scan of the backing array.
    fn give(&mut self, item: &T) -> Result<(), PoolError>;

    /// Return the item currently stored at backing `index`.
    fn give_at(&mut self, index: usize) -> Result<(), PoolError>;

    /// Backing array in partition order: given prefix then free suffix.
    fn items(&self) -> &[T];

    /// Number of given items (the partition boundary).
    fn used(&self) -> usize;

    fn capacity(&self) -> usize {
        self.items().len()
    }

    fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    fn has_free_slot(&self) -> bool {
        self.used() < self.capacity()
    }

    fn given(&self) -> &[T] {
        &self.items()[..self.used()]
    }

    fn free(&self) -> &[T] {
        &self.items()[self.used()..]
    }
}

/// How a pool moves a returned item back into the free suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PoolStrategy {
    /// Swap with the last given item. O(1), given order not preserved.
    #[default]
    Swap,
    /// Remove and append. O(n), given order preserved.
    Ordered,
}

impl PoolStrategy {
    /// Build a boxed pool over `items` using this strategy.
    pub fn build<T>(self, items: Vec<T>) -> Box<dyn Pool<T>>
    where
        T: Clone + PartialEq + Debug + 'static,
    {
        match self {
            PoolStrategy::Swap => Box::new(SlotPool::new(items)),
            PoolStrategy::Ordered => Box::new(OrderedPool::new(items)),
        }
    }
}

/// Shared bookkeeping for both strategies.
#[derive(Debug, Clone)]
struct Partition<T> {
    items: Vec<T>,
    free_idx: usize,
}

impl<T: Clone + PartialEq> Partition<T> {
    fn new(items: Vec<T>) -> Self {
        Self { items, free_idx: 0 }
    }

    fn take_next(&mut self) -> Result<T, PoolError> {
        let item = self
            .items
            .get(self.free_idx)
            .cloned()
            .ok_or(PoolError::CapacityExhausted {
                capacity: self.items.len(),
            })?;
        self.free_idx += 1;
        Ok(item)
    }

    fn position(&self, item: &T) -> Result<usize, PoolError> {
        self.items
            .iter()
            .position(|candidate| candidate == item)
            .ok_or(PoolError::UnknownItem)
    }

    /// Validate that `index` is inside the given prefix.
    fn check_given(&self, index: usize) -> Result<(), PoolError> {
        if index >= self.items.len() {
            return Err(PoolError::IndexOutOfRange {
                index,
                capacity: self.items.len(),
            });
        }
        if index >= self.free_idx {
            return Err(PoolError::DoubleRelease {
                index,
                free_idx: self.free_idx,
            });
        }
        Ok(())
    }
}

pub fn crate_info() -> &'static str {
    "isoroom-pool v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("pool"));
    }

    #[test]
    fn strategy_builds_both_pools() {
        for strategy in [PoolStrategy::Swap, PoolStrategy::Ordered] {
            let mut pool = strategy.build((0..4u32).collect::<Vec<u32>>());
            assert_eq!(pool.capacity(), 4);
            let a = pool.get().unwrap();
            assert_eq!(pool.used(), 1);
            pool.give(&a).unwrap();
            assert_eq!(pool.remaining(), 4);
        }
    }

    #[test]
    fn default_strategy_is_swap() {
        assert_eq!(PoolStrategy::default(), PoolStrategy::Swap);
    }
}
