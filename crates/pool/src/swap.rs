use crate::{Partition, Pool, PoolError};
use std::fmt::Debug;

/// Pool that releases by swapping with the last given item.
///
/// `get` hands out `items[free_idx]` and advances the boundary. `give` moves
/// the boundary back one and swaps the returned item into the vacated slot,
/// displacing the previous occupant into the returned item's old position.
/// Only those two elements move.
///
/// When usage stays low the same few items get recycled over and over, which
/// is fine for sprite slots.
#[derive(Debug, Clone)]
pub struct SlotPool<T> {
    inner: Partition<T>,
}

impl<T: Clone + PartialEq> SlotPool<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            inner: Partition::new(items),
        }
    }

    /// Build a pool of `size` items produced by `make`.
    pub fn from_fn(size: usize, make: impl FnMut(usize) -> T) -> Self {
        Self::new((0..size).map(make).collect())
    }
}

impl<T: Clone + PartialEq + Debug> Pool<T> for SlotPool<T> {
    fn get(&mut self) -> Result<T, PoolError> {
        self.inner.take_next()
    }

    fn give(&mut self, item: &T) -> Result<(), PoolError> {
        let index = self.inner.position(item)?;
        self.give_at(index)
    }

    fn give_at(&mut self, index: usize) -> Result<(), PoolError> {
        self.inner.check_given(index)?;
        self.inner.free_idx -= 1;
        self.inner.items.swap(self.inner.free_idx, index);
        Ok(())
    }

    fn items(&self) -> &[T] {
        &self.inner.items
    }

    fn used(&self) -> usize {
        self.inner.free_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: u32) -> SlotPool<u32> {
        SlotPool::new((0..n).collect())
    }

    fn assert_permutation(pool: &SlotPool<u32>, n: u32) {
        let mut all: Vec<u32> = pool.items().to_vec();
        all.sort_unstable();
        assert_eq!(all, (0..n).collect::<Vec<_>>());
        assert!(pool.used() <= pool.capacity());
    }

    #[test]
    fn get_hands_out_in_order() {
        let mut p = pool(3);
        assert_eq!(p.get().unwrap(), 0);
        assert_eq!(p.get().unwrap(), 1);
        assert_eq!(p.used(), 2);
        assert_eq!(p.remaining(), 1);
        assert_eq!(p.given(), &[0, 1]);
        assert_eq!(p.free(), &[2]);
    }

    #[test]
    fn round_trip_restores_boundary() {
        let mut p = pool(4);
        p.get().unwrap();
        let before = p.used();
        let item = p.get().unwrap();
        p.give(&item).unwrap();
        assert_eq!(p.used(), before);
        assert_permutation(&p, 4);
    }

    #[test]
    fn capacity_boundary() {
        let mut p = pool(3);
        for _ in 0..3 {
            p.get().unwrap();
        }
        assert!(!p.has_free_slot());
        assert_eq!(p.get(), Err(PoolError::CapacityExhausted { capacity: 3 }));
        assert_eq!(p.used(), 3);
    }

    #[test]
    fn give_swaps_with_last_given() {
        let mut p = pool(4);
        for _ in 0..3 {
            p.get().unwrap();
        }
        // given = [0, 1, 2]; returning 0 swaps it with 2
        p.give(&0).unwrap();
        assert_eq!(p.items(), &[2, 1, 0, 3]);
        assert_eq!(p.used(), 2);
        // the freed item is handed out next
        assert_eq!(p.get().unwrap(), 0);
    }

    #[test]
    fn double_release_is_rejected() {
        let mut p = pool(2);
        let a = p.get().unwrap();
        p.give(&a).unwrap();
        assert_eq!(
            p.give(&a),
            Err(PoolError::DoubleRelease {
                index: 0,
                free_idx: 0
            })
        );
        assert_eq!(p.used(), 0);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut p = pool(2);
        p.get().unwrap();
        assert_eq!(p.give(&99), Err(PoolError::UnknownItem));
    }

    #[test]
    fn give_at_out_of_range() {
        let mut p = pool(2);
        p.get().unwrap();
        assert_eq!(
            p.give_at(5),
            Err(PoolError::IndexOutOfRange {
                index: 5,
                capacity: 2
            })
        );
    }

    #[test]
    fn invariant_holds_under_churn() {
        let mut p = pool(8);
        let mut held = Vec::new();
        // deterministic interleaving of gets and gives
        for step in 0..64u32 {
            if step % 3 == 2 && !held.is_empty() {
                let item = held.remove((step as usize * 7) % held.len());
                p.give(&item).unwrap();
            } else if let Ok(item) = p.get() {
                held.push(item);
            }
            assert_eq!(p.used(), held.len());
            assert_permutation(&p, 8);
            for item in &held {
                assert!(p.given().contains(item));
            }
        }
    }

    #[test]
    fn from_fn_builds_capacity() {
        let p = SlotPool::from_fn(5, |i| i * 10);
        assert_eq!(p.capacity(), 5);
        assert_eq!(p.free(), &[0, 10, 20, 30, 40]);
    }
}
