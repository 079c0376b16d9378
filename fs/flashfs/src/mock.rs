//! An in-memory [`Flash`] implementation and record builders, used by this
//! crate's own test suite in place of real hardware.
//!
//! The no_std analogue of `fs/simple_fs`'s `dev-dependencies.rand`-driven
//! test harness: a plain `Vec<Vec<u8>>`-backed device good enough to drive
//! every code path in the restore pipeline.

use crate::area::AreaId;
use crate::codec;
use crate::error::RestoreError;
use crate::flash::{AreaHandle, Flash};
use alloc::vec;
use alloc::vec::Vec;

/// An in-memory flash device: a fixed number of equally sized regions,
/// each initialized to all-`0xFF` (erased NOR flash).
pub struct MemFlash {
    region_size: usize,
    regions: Vec<Vec<u8>>,
}

impl MemFlash {
    pub fn new(region_size: usize, region_count: usize) -> Self {
        MemFlash {
            region_size,
            regions: vec![vec![0xFFu8; region_size]; region_count],
        }
    }

    /// Direct mutable access to one region's bytes, for test fixture setup.
    pub fn region_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.regions[index]
    }
}

impl Flash for MemFlash {
    fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn region_size(&self) -> usize {
        self.region_size
    }

    fn open_region(&self, index: usize) -> Result<AreaHandle, RestoreError> {
        if index >= self.regions.len() {
            return Err(RestoreError::Flash);
        }
        Ok(AreaHandle::new(index))
    }

    fn read(&self, handle: &AreaHandle, offset: u32, buf: &mut [u8]) -> Result<(), RestoreError> {
        let region = self.regions.get(handle.region).ok_or(RestoreError::Flash)?;
        let start = offset as usize;
        let end = start + buf.len();
        if end > region.len() {
            return Err(RestoreError::Flash);
        }
        buf.copy_from_slice(&region[start..end]);
        Ok(())
    }
}

/// Incrementally appends well-formed records to one region of a
/// [`MemFlash`], tracking the write cursor so tests can build up an area's
/// log one record at a time without computing offsets by hand.
pub struct AreaBuilder<'a> {
    flash: &'a mut MemFlash,
    region: usize,
    cursor: usize,
}

impl<'a> AreaBuilder<'a> {
    /// Starts a new area in `region`, writing its header (`id = None` means
    /// scratch).
    pub fn new(flash: &'a mut MemFlash, region: usize, id: Option<u16>, gc_seq: u32) -> Self {
        let header = codec::encode_area_header(id.map(AreaId).unwrap_or(AreaId::NONE), gc_seq);
        let buf = flash.region_mut(region);
        buf[..header.len()].copy_from_slice(&header);
        AreaBuilder {
            flash,
            region,
            cursor: header.len(),
        }
    }

    pub fn inode(
        &mut self,
        directory: bool,
        deleted: bool,
        id: u32,
        seq: u32,
        parent: u32,
        name: &[u8],
    ) -> &mut Self {
        let record = codec::encode_inode_record(directory, deleted, id, seq, parent, name);
        let buf = self.flash.region_mut(self.region);
        buf[self.cursor..self.cursor + record.len()].copy_from_slice(&record);
        self.cursor += record.len();
        self
    }

    pub fn block(
        &mut self,
        deleted: bool,
        id: u32,
        seq: u32,
        owner: u32,
        payload: &[u8],
    ) -> &mut Self {
        let record = codec::encode_block_record(deleted, id, seq, owner, payload.len() as u32);
        let buf = self.flash.region_mut(self.region);
        buf[self.cursor..self.cursor + record.len()].copy_from_slice(&record);
        self.cursor += record.len();
        buf[self.cursor..self.cursor + payload.len()].copy_from_slice(payload);
        self.cursor += payload.len();
        self
    }
}
