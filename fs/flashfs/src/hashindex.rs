//! Id-to-slot lookup table (spec §6 "Hash index required").
//!
//! Maps an [`ObjectId`] to its slot index in the matching [`crate::pool::Pool`].
//! Chained bucketing keeps removal cheap and in-place, which matters during
//! sweep (§4.6), where entries are removed while other buckets are still
//! being iterated for validation.

use crate::objects::ObjectId;
use alloc::vec;
use alloc::vec::Vec;

/// Number of buckets. A fixed prime close to typical `max_inodes`/`max_blocks`
/// sizes in this pipeline's expected deployments; chains degrade gracefully
/// if it's undersized for a given device.
const BUCKET_COUNT: usize = 61;

fn bucket_of(id: ObjectId) -> usize {
    (id.0 as usize).wrapping_mul(2654435761) % BUCKET_COUNT
}

/// A chained-bucket map from [`ObjectId`] to pool slot index.
pub struct HashIndex {
    buckets: Vec<Vec<(ObjectId, usize)>>,
}

impl HashIndex {
    pub fn new() -> Self {
        HashIndex {
            buckets: vec![Vec::new(); BUCKET_COUNT],
        }
    }

    /// Inserts or overwrites the slot mapped to `id`.
    pub fn insert(&mut self, id: ObjectId, slot: usize) {
        let bucket = &mut self.buckets[bucket_of(id)];
        if let Some(entry) = bucket.iter_mut().find(|(k, _)| *k == id) {
            entry.1 = slot;
        } else {
            bucket.push((id, slot));
        }
    }

    /// Finds the slot currently mapped to `id`.
    pub fn find(&self, id: ObjectId) -> Option<usize> {
        self.buckets[bucket_of(id)]
            .iter()
            .find(|(k, _)| *k == id)
            .map(|(_, slot)| *slot)
    }

    /// Removes `id`'s entry, if present.
    pub fn remove(&mut self, id: ObjectId) {
        let bucket = &mut self.buckets[bucket_of(id)];
        bucket.retain(|(k, _)| *k != id);
    }

    /// Iterates all `(id, slot)` pairs across every bucket.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, usize)> + '_ {
        self.buckets.iter().flatten().copied()
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_find_remove() {
        let mut idx = HashIndex::new();
        idx.insert(ObjectId(5), 0);
        idx.insert(ObjectId(66), 1); // collides with 5 in a small table sometimes
        assert_eq!(idx.find(ObjectId(5)), Some(0));
        idx.remove(ObjectId(5));
        assert_eq!(idx.find(ObjectId(5)), None);
        assert_eq!(idx.find(ObjectId(66)), Some(1));
    }

    #[test]
    fn reinsert_overwrites_slot() {
        let mut idx = HashIndex::new();
        idx.insert(ObjectId(9), 3);
        idx.insert(ObjectId(9), 7);
        assert_eq!(idx.find(ObjectId(9)), Some(7));
    }
}
