//! The log scanner (spec §4.3).
//!
//! Walks one area's log from its current cursor, yielding each well-formed
//! record to the caller in on-disk order. A record that fails to decode ends
//! that area's scan without failing the mount — per §4.3, mid-area
//! corruption is local, not fatal; only a flash read error is.

use crate::area::{Area, AreaIndex};
use crate::codec::{self, BlockRecord, InodeRecord, RecordTag};
use crate::error::RestoreError;
use crate::flash::Flash;
use log::{debug, trace, warn};

/// One decoded record plus the area it came from, as handed to the
/// reconstructor.
#[derive(Debug, Clone)]
pub enum ScannedRecord {
    Inode(InodeRecord),
    Block(BlockRecord),
}

/// Why a scan of one area stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Ran into erased flash: a clean end of the log.
    Empty,
    /// A record failed to decode (bad tag or checksum). Local to this area.
    Corrupt,
}

/// Scans area `idx` from its current cursor to the end of its log, calling
/// `on_record` for each well-formed record in order.
///
/// Returns the reason the scan stopped. A [`RestoreError::Flash`] escaping
/// from an underlying read is propagated as-is and is the only outcome that
/// should abort the whole mount; everything else returns `Ok`.
pub fn scan_area<F: Flash>(
    idx: AreaIndex,
    area: &mut Area,
    flash: &F,
    mut on_record: impl FnMut(ScannedRecord) -> Result<(), RestoreError>,
) -> Result<ScanOutcome, RestoreError> {
    loop {
        let tag_byte = match codec::peek_tag(&area.handle, flash, area.cursor) {
            Ok(b) => b,
            Err(RestoreError::Flash) => return Err(RestoreError::Flash),
            Err(_) => {
                // Cursor ran off the end of the area rather than hitting an
                // erased-flash sentinel first. Per §4.3 this is a clean stop,
                // not corruption: a full-area log with no trailing erased
                // bytes is a normal, valid end state.
                trace!(
                    "area {:?}: cursor {} ran off area bound, treating as end of log",
                    idx, area.cursor
                );
                return Ok(ScanOutcome::Empty);
            }
        };
        if tag_byte == RecordTag::ERASED {
            trace!("area {:?}: end of log at offset {}", idx, area.cursor);
            return Ok(ScanOutcome::Empty);
        }
        let tag = match codec::tag_at(tag_byte) {
            Some(tag) => tag,
            None => {
                warn!(
                    "area {:?}: unrecognized record tag {:#x} at offset {}",
                    idx, tag_byte, area.cursor
                );
                return Ok(ScanOutcome::Corrupt);
            }
        };

        match tag {
            RecordTag::Inode => {
                match codec::decode_inode_record(&area.handle, flash, area.cursor) {
                    Ok(record) => {
                        debug!(
                            "area {:?}: inode id={} seq={} at offset {}",
                            idx, record.id, record.seq, area.cursor
                        );
                        area.cursor += codec::INODE_RECORD_LEN as u32;
                        on_record(ScannedRecord::Inode(record))?;
                    }
                    Err(RestoreError::Flash) => return Err(RestoreError::Flash),
                    Err(_) => {
                        warn!("area {:?}: corrupt inode record at offset {}", idx, area.cursor);
                        return Ok(ScanOutcome::Corrupt);
                    }
                }
            }
            RecordTag::Block => {
                match codec::decode_block_record(&area.handle, flash, area.cursor) {
                    Ok(record) => {
                        debug!(
                            "area {:?}: block id={} seq={} len={} at offset {}",
                            idx, record.id, record.seq, record.data_len, area.cursor
                        );
                        let next_cursor =
                            record.payload_offset.saturating_add(record.data_len);
                        if next_cursor as usize > flash.region_size() {
                            warn!("area {:?}: block payload runs past area bound", idx);
                            return Ok(ScanOutcome::Corrupt);
                        }
                        area.cursor = next_cursor;
                        on_record(ScannedRecord::Block(record))?;
                    }
                    Err(RestoreError::Flash) => return Err(RestoreError::Flash),
                    Err(_) => {
                        warn!("area {:?}: corrupt block record at offset {}", idx, area.cursor);
                        return Ok(ScanOutcome::Corrupt);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{AreaBuilder, MemFlash};

    fn opened_area(flash: &MemFlash, region: usize) -> Area {
        Area {
            handle: flash.open_region(region).unwrap(),
            id: crate::area::AreaId(0),
            gc_seq: 0,
            cursor: codec::AREA_HEADER_LEN as u32,
            is_scratch: false,
        }
    }

    #[test]
    fn stops_cleanly_at_the_erased_marker() {
        let mut flash = MemFlash::new(256, 1);
        AreaBuilder::new(&mut flash, 0, Some(1), 0)
            .inode(true, false, 1, 0, 0, b"");
        let mut area = opened_area(&flash, 0);

        let mut seen = 0;
        let outcome = scan_area(AreaIndex(0), &mut area, &flash, |_| {
            seen += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(outcome, ScanOutcome::Empty);
        assert_eq!(seen, 1);
    }

    #[test]
    fn corrupt_record_ends_the_scan_without_failing_the_mount() {
        let mut flash = MemFlash::new(256, 1);
        AreaBuilder::new(&mut flash, 0, Some(1), 0).inode(true, false, 1, 0, 0, b"a");
        // Stamp a tag byte right after the first, well-formed record that is
        // neither a known record tag nor the erased-flash sentinel.
        let second_record_start = codec::AREA_HEADER_LEN + codec::INODE_RECORD_LEN;
        flash.region_mut(0)[second_record_start] = codec::RecordTag::ERASED.wrapping_sub(1);
        let mut area = opened_area(&flash, 0);

        let mut seen = 0;
        let outcome = scan_area(AreaIndex(0), &mut area, &flash, |_| {
            seen += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(outcome, ScanOutcome::Corrupt);
        assert_eq!(seen, 1);
    }

    #[test]
    fn a_full_area_with_no_trailing_erased_bytes_is_a_clean_stop() {
        let region_size = codec::AREA_HEADER_LEN + codec::INODE_RECORD_LEN;
        let mut flash = MemFlash::new(region_size, 1);
        AreaBuilder::new(&mut flash, 0, Some(1), 0).inode(true, false, 1, 0, 0, b"");
        let mut area = opened_area(&flash, 0);

        let mut seen = 0;
        let outcome = scan_area(AreaIndex(0), &mut area, &flash, |_| {
            seen += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(outcome, ScanOutcome::Empty);
        assert_eq!(seen, 1);
    }

    #[test]
    fn block_payload_running_past_the_area_bound_is_corrupt() {
        let mut flash = MemFlash::new(64, 1);
        // A correctly checksummed record whose claimed `data_len` is larger
        // than the area could ever hold, independent of whatever payload
        // bytes actually follow it.
        let record = codec::encode_block_record(false, 1, 0, 1, 200);
        let header_end = codec::AREA_HEADER_LEN;
        flash.region_mut(0)[..header_end].copy_from_slice(&codec::encode_area_header(
            crate::area::AreaId(1),
            0,
        ));
        flash.region_mut(0)[header_end..header_end + record.len()].copy_from_slice(&record);
        let mut area = opened_area(&flash, 0);

        let outcome = scan_area(AreaIndex(0), &mut area, &flash, |_| Ok(())).unwrap();

        assert_eq!(outcome, ScanOutcome::Corrupt);
    }
}
