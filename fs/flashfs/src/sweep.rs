//! The sweeper (spec §4.6).
//!
//! Removes anything restore could not fully resolve: tombstoned (`DELETED`)
//! objects and dummy placeholders nothing ever defined a real record for.
//! Removing an inode cascades to every block it owns, since a block whose
//! owner just vanished is meaningless on its own (spec scenario "dangling
//! block reference").

use crate::objects::{Block, BlockFlags, Inode, InodeFlags, ObjectId};
use crate::store::ObjectStore;
use alloc::vec::Vec;
use log::debug;

/// Runs the sweep pass, removing dead inodes and blocks in place.
pub fn sweep(inodes: &mut ObjectStore<Inode>, blocks: &mut ObjectStore<Block>) {
    let condemned: Vec<ObjectId> = inodes
        .iter()
        .filter(|i| i.flags.intersects(InodeFlags::DELETED | InodeFlags::DUMMY))
        .map(|i| i.id)
        .collect();

    // A condemned directory's children are not necessarily condemned
    // themselves: a dummy directory created for an unresolved forward
    // reference (reconstruct.rs) can hold a real, live child if its own
    // defining record never showed up. That child becomes an orphan once its
    // parent is removed below; `validate` is what surfaces that as
    // `RestoreError::Corrupt`, not this pass.
    for id in condemned {
        let removed = match inodes.remove(id) {
            Some(r) => r,
            None => continue,
        };
        debug!("sweep: removing inode {:?} ({} blocks)", id, removed.blocks.len());

        if !removed.parent.is_none() {
            if let Some(parent) = inodes.get_mut(removed.parent) {
                parent.children.retain(|c| *c != id);
            }
        }
        for block_id in removed.blocks {
            blocks.remove(block_id);
        }
    }

    let dead_blocks: Vec<ObjectId> = blocks
        .iter()
        .filter(|b| b.flags.intersects(BlockFlags::DELETED | BlockFlags::DUMMY))
        .map(|b| b.id)
        .collect();
    for id in dead_blocks {
        debug!("sweep: removing block {:?}", id);
        blocks.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaIndex;
    use arrayvec::ArrayVec;

    fn real_dir(id: u32, parent: u32) -> Inode {
        Inode {
            id: ObjectId(id),
            seq: 0,
            area: AreaIndex(0),
            flags: InodeFlags::DIRECTORY,
            refcount: 1,
            parent: ObjectId(parent),
            children: alloc::vec::Vec::new(),
            blocks: alloc::vec::Vec::new(),
            filename: ArrayVec::new(),
        }
    }

    #[test]
    fn dummy_inode_and_its_blocks_are_swept() {
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        let mut dummy = Inode::dummy_file(ObjectId(5));
        dummy.blocks.push(ObjectId(10));
        inodes.insert(dummy).unwrap();
        blocks
            .insert(Block {
                id: ObjectId(10),
                seq: 0,
                area: AreaIndex(0),
                flags: BlockFlags::empty(),
                owner: ObjectId(5),
                data_len: 4,
                offset: 0,
            })
            .unwrap();

        sweep(&mut inodes, &mut blocks);

        assert!(!inodes.contains(ObjectId(5)));
        assert!(!blocks.contains(ObjectId(10)));
    }

    #[test]
    fn deleted_inode_is_removed_from_its_parents_children() {
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        let mut root = real_dir(1, 0);
        root.children.push(ObjectId(2));
        inodes.insert(root).unwrap();
        let mut victim = real_dir(2, 1);
        victim.flags.insert(InodeFlags::DELETED);
        inodes.insert(victim).unwrap();

        sweep(&mut inodes, &mut blocks);

        assert!(!inodes.contains(ObjectId(2)));
        assert!(inodes.get(ObjectId(1)).unwrap().children.is_empty());
    }

    #[test]
    fn live_objects_survive_sweep() {
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        inodes.insert(real_dir(1, 0)).unwrap();
        sweep(&mut inodes, &mut blocks);
        assert!(inodes.contains(ObjectId(1)));
    }

    #[test]
    fn a_condemned_dummy_directory_with_a_real_live_child_does_not_panic() {
        // A forward reference (reconstruct.rs) can leave a dummy directory
        // placeholder holding a real child it never got a defining record
        // for. Sweeping that dummy away must not assume its children are
        // also condemned — the child is simply orphaned, for `validate` to
        // catch, not this pass.
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        let mut dummy_parent = Inode::dummy_directory(ObjectId(5));
        dummy_parent.children.push(ObjectId(2));
        inodes.insert(dummy_parent).unwrap();
        let mut child = real_dir(2, 5);
        child.flags = InodeFlags::empty();
        inodes.insert(child).unwrap();

        sweep(&mut inodes, &mut blocks);

        assert!(!inodes.contains(ObjectId(5)));
        assert!(inodes.contains(ObjectId(2)));
        assert_eq!(inodes.get(ObjectId(2)).unwrap().parent, ObjectId(5));
    }
}
