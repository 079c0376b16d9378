//! The flash layer trait (spec §6 "Flash layer required").
//!
//! This crate never issues a physical write; restore is read-only over flash
//! except for the in-RAM bookkeeping produced along the way (§4.5's "reformat"
//! step only ever touches the in-RAM [`crate::area::Area`] descriptor, never
//! the device — see `DESIGN.md`).

use crate::error::RestoreError;

/// A raw, read-only view of one physical flash region (one erase unit).
///
/// Implementors own whatever addressing scheme maps a region index to a
/// physical range; this crate only ever reads through a `Flash` + its
/// `AreaHandle`s, never by raw address.
pub trait Flash {
    /// Number of physical regions this device exposes. Regions are probed
    /// `0..region_count()` by the area detector.
    fn region_count(&self) -> usize;

    /// Size, in bytes, of one region.
    fn region_size(&self) -> usize;

    /// Opens region `index` for reading. Fails only on a genuine device
    /// error (`RestoreError::Flash`) — an out-of-range index is a caller
    /// bug, not a flash error, and panics in debug builds via the
    /// implementation's own bounds check.
    fn open_region(&self, index: usize) -> Result<AreaHandle, RestoreError>;

    /// Reads `buf.len()` bytes starting at region-relative offset `offset`
    /// from the region named by `handle`.
    fn read(&self, handle: &AreaHandle, offset: u32, buf: &mut [u8]) -> Result<(), RestoreError>;
}

/// A handle identifying one physical region, area-relative offsets resolved
/// against it by the owning [`Flash`] implementation.
///
/// Carries no borrow of the device itself so it can be stored in
/// [`crate::area::Area`] and outlive the probe that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaHandle {
    pub region: usize,
}

impl AreaHandle {
    pub fn new(region: usize) -> Self {
        AreaHandle { region }
    }
}

/// Reads `buf.len()` bytes at `offset` within `handle`'s region, bounds
/// checking against `flash.region_size()` before issuing the read so an
/// out-of-range request becomes `RestoreError::Corrupt` rather than an
/// implementation-defined panic or silent truncation.
pub fn read_bounded<F: Flash>(
    flash: &F,
    handle: &AreaHandle,
    offset: u32,
    buf: &mut [u8],
) -> Result<(), RestoreError> {
    let end = offset as usize + buf.len();
    if end > flash.region_size() {
        return Err(RestoreError::Corrupt("read past area bound"));
    }
    flash.read(handle, offset, buf)
}
