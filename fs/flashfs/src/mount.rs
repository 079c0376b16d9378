//! The mount driver (spec §4.8): the single entry point that runs the whole
//! restore pipeline and hands back a consistent, owned filesystem handle.

use crate::area::{AreaIndex, AreaTable};
use crate::error::RestoreError;
use crate::flash::Flash;
use crate::objects::{Block, Inode, ObjectId, ROOT_ID};
use crate::scanner::ScannedRecord;
use crate::store::ObjectStore;
use crate::{reconstruct, recover, scanner, sweep, validate};
use alloc::vec::Vec;
use log::{info, warn};

/// Per-device tunables. None of these affect on-disk format, only the
/// capacity of this build's in-RAM tables.
#[derive(Debug, Clone, Copy)]
pub struct RestoreConfig {
    /// Upper bound on the number of areas `area::detect_areas` will accept.
    pub max_areas: usize,
    /// Inode pool capacity.
    pub max_inodes: usize,
    /// Block pool capacity.
    pub max_blocks: usize,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        RestoreConfig {
            max_areas: crate::area::MAX_AREAS,
            max_inodes: 256,
            max_blocks: 1024,
        }
    }
}

/// The restored, owned filesystem state. Not a set of process-wide statics —
/// per the spec's own Design Notes, ownership is explicit: a caller embedding
/// this crate in a concurrent runtime wraps this handle in whatever lock that
/// runtime supplies.
pub struct Filesystem {
    pub inodes: ObjectStore<Inode>,
    pub blocks: ObjectStore<Block>,
    pub areas: AreaTable,
    pub scratch: Option<AreaIndex>,
    pub root: ObjectId,
    pub max_block_payload: u32,
    /// One id allocator shared across inodes and blocks (§3 "process-wide
    /// state"), left at one past the highest id any accepted record named —
    /// including ones later swept away — so a client allocating fresh ids
    /// after mount never reissues one that used to mean something.
    pub next_id: ObjectId,
}

/// Runs the full restore pipeline over `flash` and returns a mounted
/// filesystem, or the first fatal error encountered.
///
/// Any `Err` leaves no state behind to clean up: the partially built
/// [`Filesystem`] lives only on this call's stack and is simply dropped,
/// which is the entire "reset all process-wide state" behavior §4.8 asks
/// for when there is no process-wide state to begin with.
pub fn restore<F: Flash>(flash: &F, config: &RestoreConfig) -> Result<Filesystem, RestoreError> {
    match restore_inner(flash, config) {
        Ok(fs) => Ok(fs),
        Err(e) => {
            warn!("restore aborted: {e}");
            Err(e)
        }
    }
}

fn restore_inner<F: Flash>(flash: &F, config: &RestoreConfig) -> Result<Filesystem, RestoreError> {
    let mut areas = crate::area::detect_areas(flash)?;
    if areas.len() > config.max_areas {
        return Err(RestoreError::Oom);
    }
    info!("detected {} area(s)", areas.len());

    // §4.5's trigger is "no scratch area was found," not merely "a duplicate
    // id exists" — if a scratch area is already registered, a duplicate id
    // is a deeper corruption this recoverer does not attempt to repair.
    let excluded = if areas.scratch().is_none() {
        let excluded = recover::recover_from_crashed_gc(&mut areas);
        if !excluded.is_empty() {
            warn!("recovered from {} crashed-GC twin area(s)", excluded.len());
        }
        excluded
    } else {
        Vec::new()
    };

    let mut inodes = ObjectStore::new(config.max_inodes);
    let mut blocks = ObjectStore::new(config.max_blocks);
    let mut next_id: u32 = 1;

    let order: Vec<AreaIndex> = areas.iter().map(|(idx, _)| idx).collect();
    for idx in order {
        if excluded.contains(&idx) {
            continue;
        }
        let is_scratch = areas.get(idx).map(|a| a.is_scratch).unwrap_or(false);
        if is_scratch {
            continue;
        }
        let area = areas
            .get_mut(idx)
            .ok_or(RestoreError::Corrupt("area vanished mid-restore"))?;
        scanner::scan_area(idx, area, flash, |record| match record {
            ScannedRecord::Inode(rec) => {
                next_id = next_id.max(rec.id.saturating_add(1));
                reconstruct::merge_inode(&mut inodes, &rec, idx)
            }
            ScannedRecord::Block(rec) => {
                next_id = next_id.max(rec.id.saturating_add(1));
                reconstruct::merge_block(&mut inodes, &mut blocks, &rec, idx)
            }
        })?;
    }

    sweep::sweep(&mut inodes, &mut blocks);
    validate::validate(&areas, &inodes, &blocks)?;

    let scratch = areas.scratch();
    let max_block_payload = validate::max_block_payload(&areas, flash);

    info!(
        "mounted: {} inode(s), {} block(s), scratch={:?}, root={:?}, next_id={}",
        inodes.len(),
        blocks.len(),
        scratch,
        ROOT_ID,
        next_id
    );

    Ok(Filesystem {
        inodes,
        blocks,
        areas,
        scratch,
        root: ROOT_ID,
        max_block_payload,
        next_id: ObjectId(next_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{AreaBuilder, MemFlash};
    use crate::objects::InodeFlags;

    const REGION_SIZE: usize = 4096;

    fn cfg() -> RestoreConfig {
        RestoreConfig {
            max_areas: 8,
            max_inodes: 64,
            max_blocks: 64,
        }
    }

    #[test]
    fn empty_flash_fails_cleanly() {
        let flash = MemFlash::new(REGION_SIZE, 2);
        let err = restore(&flash, &cfg()).unwrap_err();
        assert_eq!(err, RestoreError::Corrupt("root inode missing"));
    }

    #[test]
    fn freshly_formatted_area_and_scratch_mounts_with_just_root() {
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        AreaBuilder::new(&mut flash, 0, Some(1), 0).inode(true, false, 1, 0, 0, b"");
        AreaBuilder::new(&mut flash, 1, None, 0);

        let fs = restore(&flash, &cfg()).unwrap();
        assert_eq!(fs.inodes.len(), 1);
        assert_eq!(fs.blocks.len(), 0);
        assert!(fs.scratch.is_some());
        assert!(fs
            .inodes
            .get(ROOT_ID)
            .unwrap()
            .flags
            .contains(InodeFlags::DIRECTORY));
    }

    #[test]
    fn single_file_restores_with_parent_and_block_linked() {
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        AreaBuilder::new(&mut flash, 0, Some(1), 0)
            .inode(true, false, 1, 0, 0, b"")
            .inode(false, false, 2, 0, 1, b"a.txt")
            .block(false, 10, 0, 2, b"hello");
        AreaBuilder::new(&mut flash, 1, None, 0);

        let fs = restore(&flash, &cfg()).unwrap();
        assert_eq!(fs.inodes.len(), 2);
        assert_eq!(fs.blocks.len(), 1);
        let root = fs.inodes.get(ROOT_ID).unwrap();
        assert_eq!(root.children, alloc::vec![ObjectId(2)]);
        let file = fs.inodes.get(ObjectId(2)).unwrap();
        assert_eq!(file.blocks, alloc::vec![ObjectId(10)]);
        let block = fs.blocks.get(ObjectId(10)).unwrap();
        assert_eq!(block.owner, ObjectId(2));
        assert_eq!(block.data_len, 5);
        assert!(fs.next_id.0 >= 11);
    }

    #[test]
    fn area_processing_order_does_not_affect_the_final_graph() {
        // §5/§8 order invariance: the content of the restored graph must not
        // depend on which registered area is processed first. Build the same
        // file tree split across two data areas two different ways (file in
        // area 0 vs. file in area 1) and compare the resulting graphs.
        let mut flash_a = MemFlash::new(REGION_SIZE, 3);
        AreaBuilder::new(&mut flash_a, 0, Some(1), 0).inode(true, false, 1, 0, 0, b"");
        AreaBuilder::new(&mut flash_a, 1, Some(2), 0)
            .inode(false, false, 2, 0, 1, b"a.txt")
            .block(false, 10, 0, 2, b"hi");
        AreaBuilder::new(&mut flash_a, 2, None, 0);

        let mut flash_b = MemFlash::new(REGION_SIZE, 3);
        AreaBuilder::new(&mut flash_b, 0, Some(2), 0)
            .inode(false, false, 2, 0, 1, b"a.txt")
            .block(false, 10, 0, 2, b"hi");
        AreaBuilder::new(&mut flash_b, 1, Some(1), 0).inode(true, false, 1, 0, 0, b"");
        AreaBuilder::new(&mut flash_b, 2, None, 0);

        let fs_a = restore(&flash_a, &cfg()).unwrap();
        let fs_b = restore(&flash_b, &cfg()).unwrap();

        assert_eq!(fs_a.inodes.len(), fs_b.inodes.len());
        assert_eq!(fs_a.blocks.len(), fs_b.blocks.len());
        let root_a = fs_a.inodes.get(ROOT_ID).unwrap();
        let root_b = fs_b.inodes.get(ROOT_ID).unwrap();
        assert_eq!(root_a.children, root_b.children);
        let file_a = fs_a.inodes.get(ObjectId(2)).unwrap();
        let file_b = fs_b.inodes.get(ObjectId(2)).unwrap();
        assert_eq!(file_a.blocks, file_b.blocks);
        assert_eq!(&file_a.filename[..], &file_b.filename[..]);
    }

    #[test]
    fn newer_version_wins_regardless_of_scan_order() {
        // Newer record appears later in the log: should win.
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        AreaBuilder::new(&mut flash, 0, Some(1), 0)
            .inode(true, false, 1, 0, 0, b"")
            .inode(false, false, 2, 0, 1, b"old.txt")
            .inode(false, false, 2, 1, 1, b"new.txt");
        AreaBuilder::new(&mut flash, 1, None, 0);

        let fs = restore(&flash, &cfg()).unwrap();
        let file = fs.inodes.get(ObjectId(2)).unwrap();
        assert_eq!(&file.filename[..], &b"new.txt"[..]);
        assert_eq!(file.seq, 1);
    }

    #[test]
    fn duplicate_sequence_number_is_fatal() {
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        AreaBuilder::new(&mut flash, 0, Some(1), 0)
            .inode(true, false, 1, 0, 0, b"")
            .inode(false, false, 2, 0, 1, b"a.txt")
            .inode(false, false, 2, 0, 1, b"b.txt");
        AreaBuilder::new(&mut flash, 1, None, 0);

        let err = restore(&flash, &cfg()).unwrap_err();
        assert_eq!(err, RestoreError::Corrupt("duplicate inode (id, seq)"));
    }

    #[test]
    fn dangling_block_reference_is_swept() {
        // Block 10's owner (id 5) never gets a real inode record.
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        AreaBuilder::new(&mut flash, 0, Some(1), 0)
            .inode(true, false, 1, 0, 0, b"")
            .block(false, 10, 0, 5, b"orphan");
        AreaBuilder::new(&mut flash, 1, None, 0);

        let fs = restore(&flash, &cfg()).unwrap();
        assert_eq!(fs.blocks.len(), 0);
        assert!(!fs.inodes.contains(ObjectId(5)));
    }

    #[test]
    fn crashed_gc_twin_prefers_higher_gc_seq_and_reformats_the_other() {
        // No scratch area registered at all: exactly the §4.5 trigger
        // condition, and spec §8 scenario 6's shape (two data areas sharing
        // an id, no scratch, distinct GC sequences).
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        // Stale area left behind by the crash: id 7, gc_seq 0. GC had already
        // finished copying it into scratch and promoting the copy (below)
        // before the crash interrupted reformatting this one back to scratch.
        AreaBuilder::new(&mut flash, 0, Some(7), 0)
            .inode(true, false, 1, 0, 0, b"")
            .inode(false, false, 2, 0, 1, b"old.txt");
        // The promoted copy: id 7, gc_seq 1, the complete and authoritative side.
        AreaBuilder::new(&mut flash, 1, Some(7), 1)
            .inode(true, false, 1, 0, 0, b"")
            .inode(false, false, 2, 0, 1, b"a.txt");

        let fs = restore(&flash, &cfg()).unwrap();
        assert_eq!(fs.inodes.len(), 2);
        let file = fs.inodes.get(ObjectId(2)).unwrap();
        assert_eq!(&file.filename[..], &b"a.txt"[..]);
        // The stale twin (gc_seq 0) was reformatted into the new scratch area.
        let scratch_count = fs.areas.iter().filter(|(_, a)| a.is_scratch).count();
        assert_eq!(scratch_count, 1);
        let scratch_idx = fs.areas.iter().find(|(_, a)| a.is_scratch).unwrap().0;
        assert_eq!(scratch_idx, AreaIndex(0));
    }

    #[test]
    fn twin_areas_are_not_reconciled_when_a_scratch_already_exists() {
        // A duplicate id alongside an already-registered scratch area is a
        // deeper corruption than §4.5 is meant to repair; recovery must not
        // trigger, so both twins are scanned normally and the duplicate
        // (id, seq) they share surfaces as an ordinary fatal corruption.
        let mut flash = MemFlash::new(REGION_SIZE, 3);
        AreaBuilder::new(&mut flash, 0, Some(7), 0).inode(true, false, 1, 0, 0, b"");
        AreaBuilder::new(&mut flash, 1, Some(7), 1).inode(true, false, 1, 0, 0, b"");
        AreaBuilder::new(&mut flash, 2, None, 0);

        let err = restore(&flash, &cfg()).unwrap_err();
        assert_eq!(err, RestoreError::Corrupt("duplicate inode (id, seq)"));
    }

    #[test]
    fn restore_is_idempotent() {
        let mut flash = MemFlash::new(REGION_SIZE, 2);
        AreaBuilder::new(&mut flash, 0, Some(1), 0)
            .inode(true, false, 1, 0, 0, b"")
            .inode(false, false, 2, 0, 1, b"a.txt")
            .block(false, 10, 0, 2, b"hi");
        AreaBuilder::new(&mut flash, 1, None, 0);

        let first = restore(&flash, &cfg()).unwrap();
        let second = restore(&flash, &cfg()).unwrap();
        assert_eq!(first.inodes.len(), second.inodes.len());
        assert_eq!(first.blocks.len(), second.blocks.len());
    }

    #[test]
    fn all_erased_flash_is_not_a_panic() {
        let flash = MemFlash::new(REGION_SIZE, 4);
        assert!(restore(&flash, &cfg()).is_err());
    }
}
