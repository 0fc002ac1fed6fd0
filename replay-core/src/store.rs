//! Fixed-capacity circular storage of transitions.
use crate::error::{ReplayError, Result};

/// A circular array of `capacity` slots.
///
/// Slots are filled in order until the store is full. After that every
/// insertion overwrites the oldest slot, so the store always holds the last
/// `capacity` inserted items.
///
/// Items are only handed out as clones; a slot may be overwritten by the next
/// [`insert`](TransitionStore::insert).
#[derive(Clone, Debug)]
pub struct TransitionStore<T> {
    /// Maximum number of items.
    capacity: usize,

    /// Next slot to be written.
    i: usize,

    /// Populated slots, `slots.len() <= capacity`.
    slots: Vec<T>,
}

impl<T: Clone> TransitionStore<T> {
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ReplayError::InvalidCapacity(capacity));
        }

        Ok(Self {
            capacity,
            i: 0,
            slots: Vec::with_capacity(capacity),
        })
    }

    /// Writes `item` at the cursor and returns the slot it was written to.
    pub fn insert(&mut self, item: T) -> usize {
        let ix = self.i;
        if self.slots.len() < self.capacity {
            self.slots.push(item);
        } else {
            self.slots[ix] = item;
        }
        self.i = (self.i + 1) % self.capacity;
        ix
    }

    /// Returns a copy of the item at `ix`.
    pub fn get(&self, ix: usize) -> Result<T> {
        self.slots
            .get(ix)
            .cloned()
            .ok_or_else(|| ReplayError::IndexOutOfRange {
                index: ix,
                len: self.slots.len(),
            })
    }

    /// Returns copies of the items at `ixs`, in the given order.
    pub fn gather(&self, ixs: &[usize]) -> Result<Vec<T>> {
        ixs.iter().map(|&ix| self.get(ix)).collect()
    }

    /// Returns the number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing was inserted since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the slot the next insertion writes to.
    pub fn cursor(&self) -> usize {
        self.i
    }

    /// Iterates over the stored items from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        // Before the first wrap `i == slots.len()` and the first part is empty.
        self.slots[self.i..].iter().chain(self.slots[..self.i].iter())
    }

    /// Removes all items and resets the cursor.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.i = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity() {
        assert_eq!(
            TransitionStore::<u32>::new(0).unwrap_err(),
            ReplayError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_insert_before_wrap() {
        let mut store = TransitionStore::new(4).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.insert(10), 0);
        assert_eq!(store.insert(11), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.cursor(), 2);
        assert_eq!(store.get(1).unwrap(), 11);
        assert_eq!(
            store.get(2).unwrap_err(),
            ReplayError::IndexOutOfRange { index: 2, len: 2 }
        );
        assert_eq!(store.iter().cloned().collect::<Vec<_>>(), vec![10, 11]);
    }

    #[test]
    fn test_fifo_eviction() {
        let capacity = 5;
        let mut store = TransitionStore::new(capacity).unwrap();

        for n in 0..23usize {
            let ix = store.insert(n);
            assert_eq!(ix, n % capacity);
            assert_eq!(store.len(), (n + 1).min(capacity));
            assert_eq!(store.cursor(), (n + 1) % capacity);
        }

        // Exactly the last `capacity` items survive, oldest first.
        assert_eq!(
            store.iter().cloned().collect::<Vec<_>>(),
            vec![18, 19, 20, 21, 22]
        );
        assert_eq!(store.get(23 % capacity).unwrap(), 18);
    }

    #[test]
    fn test_gather_and_clear() {
        let mut store = TransitionStore::new(3).unwrap();
        for n in 0..3 {
            store.insert(n);
        }
        assert_eq!(store.gather(&[2, 0, 2]).unwrap(), vec![2, 0, 2]);
        assert!(store.gather(&[0, 3]).is_err());

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.cursor(), 0);
        assert_eq!(store.insert(7), 0);
    }
}
