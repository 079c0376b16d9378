//! The corruption recoverer (spec §4.5): GC-crash twin detection.
//!
//! A crash mid-garbage-collection can leave two areas claiming the same
//! on-disk [`AreaId`] — the original area GC was copying out of, and the
//! freshly-started copy in what used to be the scratch area. This runs
//! after area registration and before the main scan loop, so the suspect
//! twin is simply excluded from scanning rather than merged and then
//! untangled.

use crate::area::{AreaId, AreaTable};
use alloc::vec::Vec;
use log::warn;

/// Decides, for every on-disk id claimed by more than one registered area,
/// which twin is trustworthy and which is the stale copy left behind by a
/// crashed GC.
///
/// Only meaningful once the normal registration pass has found no scratch
/// area (§4.5's trigger) — callers must gate this on `table.scratch().is_none()`.
///
/// Returns the set of area indices to exclude from the normal scan pass —
/// each one rewritten in place to look like a fresh scratch area (§4.5 step
/// 4): no flash write is issued, only the in-RAM [`crate::area::Area`]
/// descriptor changes, since physical formatting is out of this crate's
/// scope (see `DESIGN.md`).
///
/// Objects whose only on-disk copy lived in the excluded twin are never
/// created at all: anything that referenced them by id resolves to an
/// ordinary unresolved dummy placeholder and is cleaned up by the sweeper,
/// same as any other dangling reference (§4.6, §9 Design Notes).
pub fn recover_from_crashed_gc(table: &mut AreaTable) -> Vec<crate::area::AreaIndex> {
    let mut excluded = Vec::new();
    let mut handled: Vec<AreaId> = Vec::new();

    let ids: Vec<AreaId> = table
        .iter()
        .filter(|(_, a)| !a.is_scratch)
        .map(|(_, a)| a.id)
        .collect();

    for id in ids {
        if handled.contains(&id) {
            continue;
        }
        handled.push(id);

        let matches = table.find_by_id(id);
        if matches.len() < 2 {
            continue;
        }

        // With correct hardware at most two areas ever share an id (the
        // original and its one in-progress GC copy); more would itself be a
        // deeper corruption this recoverer does not attempt to untangle.
        let a = matches[0];
        let b = matches[1];
        let (good, bad) = {
            let area_a = table.get(a).expect("index from find_by_id");
            let area_b = table.get(b).expect("index from find_by_id");
            // GC promotes the freshly-written scratch copy to the area's id
            // only after the copy has finished and the old area has been
            // erased (§4.5). A crash before the old area is reformatted
            // leaves it behind still carrying the id, but with the older,
            // lower gc_seq; the promoted copy carries the higher one and is
            // the complete, authoritative side of the twin.
            if area_a.gc_seq >= area_b.gc_seq {
                (a, b)
            } else {
                (b, a)
            }
        };

        warn!(
            "area id {:?}: twin areas detected, trusting {:?} over {:?}",
            id, good, bad
        );

        if let Some(bad_area) = table.get_mut(bad) {
            bad_area.id = AreaId::NONE;
            bad_area.is_scratch = true;
            bad_area.cursor = crate::codec::AREA_HEADER_LEN as u32;
        }
        excluded.push(bad);
    }

    excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{Area, AreaIndex};
    use crate::flash::AreaHandle;

    fn area(region: usize, id: u16, gc_seq: u32) -> Area {
        Area {
            handle: AreaHandle::new(region),
            id: AreaId(id),
            gc_seq,
            cursor: 16,
            is_scratch: false,
        }
    }

    #[test]
    fn higher_gc_seq_wins_and_loser_becomes_scratch() {
        let mut table = AreaTable::new();
        table.push(area(0, 7, 3));
        table.push(area(1, 7, 9));

        let excluded = recover_from_crashed_gc(&mut table);

        assert_eq!(excluded, alloc::vec![AreaIndex(0)]);
        let loser = table.get(AreaIndex(0)).unwrap();
        assert!(loser.is_scratch);
        assert_eq!(loser.id, AreaId::NONE);
        let winner = table.get(AreaIndex(1)).unwrap();
        assert!(!winner.is_scratch);
        assert_eq!(winner.gc_seq, 9);
    }

    #[test]
    fn areas_with_distinct_ids_are_left_untouched() {
        let mut table = AreaTable::new();
        table.push(area(0, 1, 0));
        table.push(area(1, 2, 0));

        let excluded = recover_from_crashed_gc(&mut table);

        assert!(excluded.is_empty());
    }

    #[test]
    fn scratch_areas_are_never_treated_as_a_twin_side() {
        let mut table = AreaTable::new();
        table.push(area(0, 5, 1));
        let mut scratch = area(1, 5, 0);
        scratch.is_scratch = true;
        scratch.id = AreaId::NONE;
        table.push(scratch);

        let excluded = recover_from_crashed_gc(&mut table);

        assert!(excluded.is_empty());
    }
}
