//! Area identity and the area registry (spec §4.1–4.2).
//!
//! An "area" is one erase-unit-sized region of flash. Each area carries a
//! header recorded when it was last formatted: an on-disk [`AreaId`] (stable
//! across GC, reused by exactly one live area plus, transiently, its crashed
//! twin) and a GC sequence number that breaks ties between twins.

use crate::error::RestoreError;
use crate::flash::{AreaHandle, Flash};
use arrayvec::ArrayVec;

/// The on-disk identity of an area, as recorded in its header.
///
/// `AreaId::NONE` (`0xFFFF`) marks the scratch area: per §4.1, the scratch
/// area's header carries the sentinel instead of a real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AreaId(pub u16);

impl AreaId {
    /// Sentinel marking "this is the scratch area."
    pub const NONE: AreaId = AreaId(0xFFFF);

    #[inline]
    pub fn is_scratch(self) -> bool {
        self == AreaId::NONE
    }
}

/// An index into the restored area table — "which registered area," as
/// opposed to [`AreaId`] which is "what on-disk identity."
///
/// Distinguishing the two matters for GC-crash recovery: two different
/// `AreaIndex`es (two physical regions) can carry the same `AreaId` (the
/// "twin" case in §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AreaIndex(pub u16);

impl AreaIndex {
    /// Sentinel: "no area," used by dummy objects that have never been
    /// backed by a real on-disk record.
    pub const NONE: AreaIndex = AreaIndex(0xFFFF);
}

/// One registered area's bookkeeping, built during §4.1–4.2 detection.
#[derive(Debug, Clone)]
pub struct Area {
    /// The physical region this registry entry describes.
    pub handle: AreaHandle,
    /// On-disk id from the area header, or `AreaId::NONE` if scratch.
    pub id: AreaId,
    /// GC sequence number from the header; used to pick a winner between
    /// twin areas sharing the same `id`.
    pub gc_seq: u32,
    /// Byte offset, header-relative, of the first unscanned byte. Advances
    /// as the scanner walks the log; left at the header size for an
    /// untouched area.
    pub cursor: u32,
    /// Whether this area is the scratch area (carries `AreaId::NONE`).
    pub is_scratch: bool,
}

/// Parsed contents of an area header (§6 "on-disk formats").
#[derive(Debug, Clone, Copy)]
pub struct AreaHeader {
    pub id: AreaId,
    pub gc_seq: u32,
}

/// Maximum number of areas this build's area table can hold. Kept as a
/// build-time cap rather than a runtime-config field so the table itself can
/// be a plain fixed-capacity `ArrayVec`, matching the rest of the crate's
/// "bounded inline storage" convention.
pub const MAX_AREAS: usize = 64;

/// The restored area table: every area detected as carrying a valid header,
/// in detection order.
#[derive(Debug, Clone, Default)]
pub struct AreaTable {
    areas: ArrayVec<Area, MAX_AREAS>,
}

impl AreaTable {
    pub fn new() -> Self {
        AreaTable {
            areas: ArrayVec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn get(&self, idx: AreaIndex) -> Option<&Area> {
        self.areas.get(idx.0 as usize)
    }

    pub fn get_mut(&mut self, idx: AreaIndex) -> Option<&mut Area> {
        self.areas.get_mut(idx.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AreaIndex, &Area)> {
        self.areas
            .iter()
            .enumerate()
            .map(|(i, a)| (AreaIndex(i as u16), a))
    }

    /// Registers a probed area, or returns `None` if the table is already at
    /// `MAX_AREAS` capacity (surfaced by the caller as `RestoreError::Oom`).
    pub(crate) fn push(&mut self, area: Area) -> Option<AreaIndex> {
        let idx = AreaIndex(self.areas.len() as u16);
        self.areas.try_push(area).ok()?;
        Some(idx)
    }

    /// Finds every registered area currently carrying on-disk id `id`.
    ///
    /// With correct hardware this returns at most one match; two matches is
    /// exactly the "twin" condition §4.5 exists to repair.
    pub fn find_by_id(&self, id: AreaId) -> ArrayVec<AreaIndex, 2> {
        let mut out = ArrayVec::new();
        for (idx, area) in self.iter() {
            if area.id == id {
                let _ = out.try_push(idx);
            }
        }
        out
    }

    /// The single scratch area, if one has been registered.
    pub fn scratch(&self) -> Option<AreaIndex> {
        self.iter().find(|(_, a)| a.is_scratch).map(|(i, _)| i)
    }
}

/// Probes every region the flash layer reports, registering each one whose
/// header decodes as valid (§4.1 "area detector").
///
/// Garbage / unformatted regions (header fails to decode) are silently
/// skipped, per §4.1's "not every region of flash necessarily holds a valid
/// area — skip it" rule; this is not an error. A second area that advertises
/// scratch is likewise silently dropped rather than registered, per §4.2's
/// "at most one scratch" rule — it is not surfaced as corruption.
pub fn detect_areas<F: Flash>(flash: &F) -> Result<AreaTable, RestoreError> {
    let mut table = AreaTable::new();
    for region in 0..flash.region_count() {
        let handle = flash.open_region(region).map_err(|_| RestoreError::Flash)?;
        let header = match crate::codec::decode_area_header(&handle, flash) {
            Ok(h) => h,
            // A genuine device failure is fatal to the whole mount (§4.2);
            // only a header that fails to decode (bad magic, garbage
            // region) is "not a formatted area" and silently skipped.
            Err(RestoreError::Flash) => return Err(RestoreError::Flash),
            Err(_) => continue,
        };
        let is_scratch = header.id.is_scratch();
        if is_scratch && table.scratch().is_some() {
            continue;
        }
        let area = Area {
            handle,
            id: header.id,
            gc_seq: header.gc_seq,
            cursor: crate::codec::AREA_HEADER_LEN as u32,
            is_scratch,
        };
        table
            .push(area)
            .ok_or(RestoreError::Oom)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemFlash;

    #[test]
    fn garbage_regions_are_silently_skipped() {
        let mut flash = MemFlash::new(32, 2);
        // Region 0 gets a real header; region 1 is left all-0xFF (never
        // formatted).
        let header = crate::codec::encode_area_header(AreaId(1), 0);
        flash.region_mut(0)[..header.len()].copy_from_slice(&header);

        let table = detect_areas(&flash).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(AreaIndex(0)).unwrap().id, AreaId(1));
    }

    #[test]
    fn every_registered_region_can_become_scratch() {
        let mut flash = MemFlash::new(32, 1);
        let header = crate::codec::encode_area_header(AreaId::NONE, 0);
        flash.region_mut(0)[..header.len()].copy_from_slice(&header);

        let table = detect_areas(&flash).unwrap();

        assert_eq!(table.scratch(), Some(AreaIndex(0)));
    }

    #[test]
    fn a_second_scratch_area_is_silently_dropped() {
        let mut flash = MemFlash::new(32, 2);
        let header = crate::codec::encode_area_header(AreaId::NONE, 0);
        flash.region_mut(0)[..header.len()].copy_from_slice(&header);
        flash.region_mut(1)[..header.len()].copy_from_slice(&header);

        let table = detect_areas(&flash).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.scratch(), Some(AreaIndex(0)));
    }

    #[test]
    fn a_flash_read_failure_aborts_detection_entirely() {
        struct FailingFlash;
        impl Flash for FailingFlash {
            fn region_count(&self) -> usize {
                1
            }
            fn region_size(&self) -> usize {
                32
            }
            fn open_region(&self, _index: usize) -> Result<AreaHandle, RestoreError> {
                Ok(AreaHandle::new(0))
            }
            fn read(&self, _handle: &AreaHandle, _offset: u32, _buf: &mut [u8]) -> Result<(), RestoreError> {
                Err(RestoreError::Flash)
            }
        }

        let err = detect_areas(&FailingFlash).unwrap_err();
        assert_eq!(err, RestoreError::Flash);
    }
}
