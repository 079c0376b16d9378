//! The object reconstructor (spec §4.4) — the architectural core of restore.
//!
//! Folds a stream of [`crate::scanner::ScannedRecord`]s, in on-disk order,
//! into the two typed object stores. Every record is merged against
//! whatever the store already holds for that id — a previously-seen real
//! record, a dummy placeholder created by an earlier forward reference, or
//! nothing at all.

use crate::codec::{BlockRecord, InodeRecord};
use crate::area::AreaIndex;
use crate::error::RestoreError;
use crate::objects::{Block, BlockFlags, Inode, InodeFlags, ObjectId};
use crate::store::ObjectStore;
use alloc::vec::Vec;
use log::warn;

/// Merges one inode record into `inodes`, creating or linking parent
/// placeholders as needed.
///
/// Per §4.4's arbitration table: a strictly newer `seq` replaces the current
/// object in place (preserving any children/blocks already discovered
/// against this id); a strictly older `seq` is ignored as stale; an equal
/// `seq` on a distinct record is on-disk corruption this crate cannot
/// arbitrate between and is fatal to the mount.
pub fn merge_inode(
    inodes: &mut ObjectStore<Inode>,
    rec: &InodeRecord,
    area_idx: AreaIndex,
) -> Result<(), RestoreError> {
    let id = ObjectId(rec.id);
    let old_parent = inodes.get(id).map(|existing| existing.parent);

    match inodes.get(id) {
        Some(existing) if existing.seq == rec.seq && !existing_is_unbacked(existing) => {
            warn!("duplicate inode id={} seq={}", rec.id, rec.seq);
            return Err(RestoreError::Corrupt("duplicate inode (id, seq)"));
        }
        Some(existing) if !existing_is_unbacked(existing) && existing.seq > rec.seq => {
            // Stale: a newer version of this id was already merged. Ignore.
            return Ok(());
        }
        Some(existing) => {
            if existing.flags.contains(InodeFlags::DUMMY) {
                let inferred_directory = existing.flags.contains(InodeFlags::DIRECTORY);
                if inferred_directory != rec.directory {
                    return Err(RestoreError::Corrupt("inode type mismatch on resolve"));
                }
            }
            let children = existing.children.clone();
            let blocks = existing.blocks.clone();
            let new_inode = build_inode(id, rec, area_idx, children, blocks);
            inodes.replace(id, new_inode);
        }
        None => {
            let new_inode = build_inode(id, rec, area_idx, Vec::new(), Vec::new());
            inodes.insert(new_inode)?;
        }
    }

    relink_parent(inodes, id, old_parent, ObjectId(rec.parent))?;
    Ok(())
}

/// A dummy placeholder is not yet "backed" by any real record; its `seq`
/// field is meaningless (always 0) and must never win or lose an
/// arbitration, only be unconditionally replaced.
fn existing_is_unbacked(existing: &Inode) -> bool {
    existing.flags.contains(InodeFlags::DUMMY) && existing.area == AreaIndex::NONE
}

fn build_inode(
    id: ObjectId,
    rec: &InodeRecord,
    area_idx: AreaIndex,
    children: Vec<ObjectId>,
    blocks: Vec<ObjectId>,
) -> Inode {
    let mut flags = InodeFlags::empty();
    if rec.directory {
        flags |= InodeFlags::DIRECTORY;
    }
    if rec.deleted {
        flags |= InodeFlags::DELETED;
    }
    Inode {
        id,
        seq: rec.seq,
        area: area_idx,
        flags,
        refcount: 1,
        parent: ObjectId(rec.parent),
        children,
        blocks,
        filename: rec.name.clone(),
    }
}

/// Moves `id` to be a child of `new_parent`, removing it from `old_parent`'s
/// child list first if it had one and the parent actually changed. Creates a
/// dummy directory placeholder for an unseen parent, per §4.4's
/// forward-reference rule.
fn relink_parent(
    inodes: &mut ObjectStore<Inode>,
    id: ObjectId,
    old_parent: Option<ObjectId>,
    new_parent: ObjectId,
) -> Result<(), RestoreError> {
    if id == crate::objects::ROOT_ID {
        return Ok(());
    }
    if let Some(old_parent) = old_parent {
        if !old_parent.is_none() && old_parent != new_parent {
            if let Some(old) = inodes.get_mut(old_parent) {
                old.children.retain(|c| *c != id);
            }
        } else if old_parent == new_parent {
            return Ok(()); // already linked, nothing to do
        }
    }
    if new_parent.is_none() {
        return Ok(());
    }
    if !inodes.contains(new_parent) {
        inodes.insert(Inode::dummy_directory(new_parent))?;
    } else if let Some(parent) = inodes.get(new_parent) {
        if !parent.flags.contains(InodeFlags::DIRECTORY) {
            return Err(RestoreError::Corrupt("parent is not a directory"));
        }
    }
    if let Some(parent) = inodes.get_mut(new_parent) {
        if !parent.children.contains(&id) {
            parent.children.push(id);
        }
    }
    Ok(())
}

/// Merges one block record into `blocks`, resolving (or creating) its owner
/// inode as needed.
pub fn merge_block(
    inodes: &mut ObjectStore<Inode>,
    blocks: &mut ObjectStore<Block>,
    rec: &BlockRecord,
    area_idx: AreaIndex,
) -> Result<(), RestoreError> {
    let id = ObjectId(rec.id);
    let owner = ObjectId(rec.owner);

    match blocks.get(id) {
        Some(existing) if existing.seq == rec.seq => {
            warn!("duplicate block id={} seq={}", rec.id, rec.seq);
            return Err(RestoreError::Corrupt("duplicate block (id, seq)"));
        }
        Some(existing) if existing.seq > rec.seq => {
            return Ok(()); // stale
        }
        Some(existing) => {
            // §4.4.2: a replace carries the owner id again, and it must
            // match the prior owner — the block stays linked to the same
            // inode across a seq bump, it never migrates owners.
            if existing.owner != owner {
                return Err(RestoreError::Corrupt("block owner mismatch on replace"));
            }
            resolve_owner(inodes, owner)?;
            let block = blocks.get_mut(id).expect("checked present above");
            block.seq = rec.seq;
            block.area = area_idx;
            block.data_len = rec.data_len;
            block.offset = rec.payload_offset;
            if rec.deleted {
                block.flags.insert(BlockFlags::DELETED);
            } else {
                block.flags.remove(BlockFlags::DELETED);
            }
            return Ok(());
        }
        None => {
            resolve_owner(inodes, owner)?;
            let mut flags = BlockFlags::empty();
            if rec.deleted {
                flags.insert(BlockFlags::DELETED);
            }
            blocks.insert(Block {
                id,
                seq: rec.seq,
                area: area_idx,
                flags,
                owner,
                data_len: rec.data_len,
                offset: rec.payload_offset,
            })?;
            if let Some(owner_inode) = inodes.get_mut(owner) {
                owner_inode.blocks.push(id);
            }
        }
    }
    Ok(())
}

/// Ensures `owner` exists as an inode, creating a dummy file placeholder if
/// it has not been seen yet, and checks that whatever does exist for it is
/// not a directory (a directory cannot own blocks).
fn resolve_owner(inodes: &mut ObjectStore<Inode>, owner: ObjectId) -> Result<(), RestoreError> {
    match inodes.get(owner) {
        Some(existing) => {
            if existing.flags.contains(InodeFlags::DIRECTORY) {
                return Err(RestoreError::Corrupt("block owner is a directory"));
            }
            Ok(())
        }
        None => {
            inodes.insert(Inode::dummy_file(owner))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrayvec::ArrayVec;

    fn inode_rec(id: u32, seq: u32, parent: u32, directory: bool, name: &[u8]) -> InodeRecord {
        let mut n = ArrayVec::new();
        n.try_extend_from_slice(name).unwrap();
        InodeRecord {
            directory,
            deleted: false,
            id,
            seq,
            parent,
            name: n,
        }
    }

    fn block_rec(id: u32, seq: u32, owner: u32, data_len: u32) -> BlockRecord {
        BlockRecord {
            deleted: false,
            id,
            seq,
            owner,
            data_len,
            payload_offset: 0,
        }
    }

    #[test]
    fn child_before_parent_resolves_to_the_real_parent() {
        let mut inodes = ObjectStore::new(8);
        // Child's record is merged before its parent's — the parent doesn't
        // exist yet.
        merge_inode(&mut inodes, &inode_rec(2, 0, 1, false, b"f"), AreaIndex(0)).unwrap();
        assert!(inodes.get(ObjectId(1)).unwrap().flags.contains(InodeFlags::DUMMY));
        assert_eq!(inodes.get(ObjectId(1)).unwrap().children, alloc::vec![ObjectId(2)]);

        merge_inode(&mut inodes, &inode_rec(1, 0, 0, true, b""), AreaIndex(0)).unwrap();
        let parent = inodes.get(ObjectId(1)).unwrap();
        assert!(!parent.flags.contains(InodeFlags::DUMMY));
        assert_eq!(parent.children, alloc::vec![ObjectId(2)]);
    }

    #[test]
    fn stale_seq_is_ignored() {
        let mut inodes = ObjectStore::new(8);
        merge_inode(&mut inodes, &inode_rec(2, 1, 0, true, b"new"), AreaIndex(0)).unwrap();
        merge_inode(&mut inodes, &inode_rec(2, 0, 0, true, b"old"), AreaIndex(0)).unwrap();
        assert_eq!(&inodes.get(ObjectId(2)).unwrap().filename[..], &b"new"[..]);
    }

    #[test]
    fn equal_seq_on_distinct_records_is_corrupt() {
        let mut inodes = ObjectStore::new(8);
        merge_inode(&mut inodes, &inode_rec(2, 0, 0, true, b"a"), AreaIndex(0)).unwrap();
        let err = merge_inode(&mut inodes, &inode_rec(2, 0, 0, true, b"b"), AreaIndex(0)).unwrap_err();
        assert_eq!(err, RestoreError::Corrupt("duplicate inode (id, seq)"));
    }

    #[test]
    fn block_with_unseen_owner_creates_dummy_file_placeholder() {
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        merge_block(&mut inodes, &mut blocks, &block_rec(10, 0, 5, 4), AreaIndex(0)).unwrap();
        let owner = inodes.get(ObjectId(5)).unwrap();
        assert!(owner.flags.contains(InodeFlags::DUMMY));
        assert!(!owner.flags.contains(InodeFlags::DIRECTORY));
        assert_eq!(owner.blocks, alloc::vec![ObjectId(10)]);
    }

    #[test]
    fn block_replace_with_mismatched_owner_is_corrupt() {
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        merge_block(&mut inodes, &mut blocks, &block_rec(10, 0, 5, 4), AreaIndex(0)).unwrap();
        let err =
            merge_block(&mut inodes, &mut blocks, &block_rec(10, 1, 6, 4), AreaIndex(0)).unwrap_err();
        assert_eq!(err, RestoreError::Corrupt("block owner mismatch on replace"));
    }

    #[test]
    fn block_owned_by_a_directory_is_corrupt() {
        let mut inodes = ObjectStore::new(8);
        let mut blocks = ObjectStore::new(8);
        merge_inode(&mut inodes, &inode_rec(1, 0, 0, true, b""), AreaIndex(0)).unwrap();
        let err = merge_block(&mut inodes, &mut blocks, &block_rec(10, 0, 1, 4), AreaIndex(0))
            .unwrap_err();
        assert_eq!(err, RestoreError::Corrupt("block owner is a directory"));
    }
}
