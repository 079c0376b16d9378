//! Fixed-capacity object allocator (spec §6 "Allocators required").
//!
//! Mirrors the slab-style fixed-capacity allocation `keos`'s own allocator
//! code favors over an unbounded `Vec::push` — a resource-constrained device
//! needs restore to fail cleanly with `RestoreError::Oom` rather than run the
//! heap out from under the rest of the system.

use crate::error::RestoreError;
use alloc::vec::Vec;

/// A slot in the pool: either live data or a link to the next free slot.
enum Slot<T> {
    Occupied(T),
    Free(Option<usize>),
}

/// A fixed-capacity pool of `T`, indexed by `usize` slot number.
///
/// Slots are never reused implicitly: a caller that removes an entry gets
/// the slot back onto the free list and must track the stale index itself
/// (the object stores built on top of this, [`crate::store::ObjectStore`],
/// never hand out a slot index to callers — only ids).
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    capacity: usize,
    len: usize,
}

impl<T> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Pool {
            slots: Vec::new(),
            free_head: None,
            capacity,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value`, returning its slot index, or `RestoreError::Oom` if
    /// the pool is already at capacity.
    pub fn insert(&mut self, value: T) -> Result<usize, RestoreError> {
        if let Some(idx) = self.free_head {
            let next = match &self.slots[idx] {
                Slot::Free(next) => *next,
                Slot::Occupied(_) => unreachable!("free list points at occupied slot"),
            };
            self.free_head = next;
            self.slots[idx] = Slot::Occupied(value);
            self.len += 1;
            return Ok(idx);
        }
        if self.slots.len() >= self.capacity {
            return Err(RestoreError::Oom);
        }
        let idx = self.slots.len();
        self.slots.push(Slot::Occupied(value));
        self.len += 1;
        Ok(idx)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        match self.slots.get(idx) {
            Some(Slot::Occupied(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        match self.slots.get_mut(idx) {
            Some(Slot::Occupied(v)) => Some(v),
            _ => None,
        }
    }

    /// Removes and returns the value at `idx`, returning the slot to the
    /// free list. Returns `None` if `idx` was already free.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        match self.slots.get(idx) {
            Some(Slot::Occupied(_)) => {}
            _ => return None,
        }
        let old = core::mem::replace(&mut self.slots[idx], Slot::Free(self.free_head));
        self.free_head = Some(idx);
        self.len -= 1;
        match old {
            Slot::Occupied(v) => Some(v),
            Slot::Free(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            Slot::Occupied(v) => Some((i, v)),
            Slot::Free(_) => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Slot::Occupied(v) => Some((i, v)),
                Slot::Free(_) => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_reuses_slot() {
        let mut pool: Pool<u32> = Pool::new(2);
        let a = pool.insert(10).unwrap();
        let b = pool.insert(20).unwrap();
        assert!(pool.insert(30).is_err());
        assert_eq!(pool.remove(a), Some(10));
        let c = pool.insert(40).unwrap();
        assert_eq!(c, a);
        assert_eq!(*pool.get(b).unwrap(), 20);
        assert_eq!(*pool.get(c).unwrap(), 40);
    }
}
