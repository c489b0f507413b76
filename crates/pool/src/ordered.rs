use crate::{Partition, Pool, PoolError};
use std::fmt::Debug;

/// Pool that keeps given items in the order they were handed out.
///
/// Releasing removes the item and appends it to the end of the backing array,
/// so every later item shifts down by one. Slower than [`crate::SlotPool`] but
/// cheaper than re-sorting the given prefix after every release.
#[derive(Debug, Clone)]
pub struct OrderedPool<T> {
    inner: Partition<T>,
}

impl<T: Clone + PartialEq> OrderedPool<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            inner: Partition::new(items),
        }
    }

    pub fn from_fn(size: usize, make: impl FnMut(usize) -> T) -> Self {
        Self::new((0..size).map(make).collect())
    }
}

impl<T: Clone + PartialEq + Debug> Pool<T> for OrderedPool<T> {
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
        let item = self.inner.items.remove(index);
        self.inner.items.push(item);
        Ok(())
    }

    fn items(&self) -> &[T] {
        &self.inner.items
    }

    fn used(&self) -> usize {
        self.inner.free_idx
    }
}
