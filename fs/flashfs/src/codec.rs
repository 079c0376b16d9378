//! On-disk formats and their codecs (spec §6 "Codecs required").
//!
//! Every decode function validates its inputs against the area bound and a
//! per-record checksum before trusting a single field; a failure here is
//! always a normal, expected outcome (unformatted flash, a torn write), never
//! a panic.

use crate::area::AreaId;
use crate::error::RestoreError;
use crate::flash::{read_bounded, AreaHandle, Flash};
use crate::objects::MAX_FILENAME;

/// Magic value stamped at the start of every area header.
const AREA_MAGIC: u32 = 0x464c_4153; // b"FLAS" as big-endian u32

/// Size, in bytes, of an area header.
pub const AREA_HEADER_LEN: usize = 12;

/// Size, in bytes, of an encoded inode record.
pub const INODE_RECORD_LEN: usize = 48;

/// Size, in bytes, of an encoded block record's fixed header (the payload
/// follows immediately after, `data_len` bytes long).
pub const BLOCK_RECORD_LEN: usize = 20;

/// Tag byte identifying a record's type at the start of the log.
///
/// `0xFF` (erased NOR flash) is handled by the scanner directly as "no more
/// records," never reaching this enum; any byte other than the two variants
/// below is corruption, folded into `RestoreError::Corrupt` at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTag {
    Inode,
    Block,
}

impl RecordTag {
    const INODE: u8 = 0xA1;
    const BLOCK: u8 = 0xB2;

    /// Byte indicating erased (unprogrammed) flash.
    pub const ERASED: u8 = 0xFF;

    fn from_byte(b: u8) -> Option<RecordTag> {
        match b {
            Self::INODE => Some(RecordTag::Inode),
            Self::BLOCK => Some(RecordTag::Block),
            _ => None,
        }
    }
}

/// A decoded inode record (spec §6 on-disk inode record, §3 `Inode`).
#[derive(Debug, Clone)]
pub struct InodeRecord {
    pub directory: bool,
    pub deleted: bool,
    pub id: u32,
    pub seq: u32,
    pub parent: u32,
    pub name: arrayvec::ArrayVec<u8, MAX_FILENAME>,
}

/// A decoded block record (spec §6 on-disk block record, §3 `Block`).
#[derive(Debug, Clone)]
pub struct BlockRecord {
    pub deleted: bool,
    pub id: u32,
    pub seq: u32,
    pub owner: u32,
    pub data_len: u32,
    /// Area-relative offset of the payload, i.e. right after this record's
    /// fixed header.
    pub payload_offset: u32,
}

/// Minimal CRC-8 (poly 0x07) used to catch a torn mid-record write.
///
/// Same role as the CRC-8 atomicity check in the pack's closest on-disk flash
/// format reference; not meant to be cryptographically meaningful, only to
/// catch "this record was partially programmed."
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Encodes an area header. Used by [`crate::mock`] to build test fixtures;
/// production code only ever decodes headers it did not write itself.
pub fn encode_area_header(id: AreaId, gc_seq: u32) -> [u8; AREA_HEADER_LEN] {
    let mut buf = [0u8; AREA_HEADER_LEN];
    buf[0..4].copy_from_slice(&AREA_MAGIC.to_be_bytes());
    buf[4..6].copy_from_slice(&id.0.to_be_bytes());
    buf[6..10].copy_from_slice(&gc_seq.to_be_bytes());
    buf
}

/// Encodes an inode record. See [`encode_area_header`].
pub fn encode_inode_record(
    directory: bool,
    deleted: bool,
    id: u32,
    seq: u32,
    parent: u32,
    name: &[u8],
) -> [u8; INODE_RECORD_LEN] {
    let mut buf = [0u8; INODE_RECORD_LEN];
    buf[0] = RecordTag::INODE;
    let mut flags = 0u8;
    if deleted {
        flags |= 0b0000_0001;
    }
    if directory {
        flags |= 0b0000_0100;
    }
    buf[1] = flags;
    buf[3] = name.len() as u8;
    buf[4..8].copy_from_slice(&id.to_be_bytes());
    buf[8..12].copy_from_slice(&seq.to_be_bytes());
    buf[12..16].copy_from_slice(&parent.to_be_bytes());
    buf[16..16 + name.len()].copy_from_slice(name);
    buf[2] = crc8(&buf[3..]);
    buf
}

/// Encodes a block record's fixed header (the payload is appended
/// separately by the caller). See [`encode_area_header`].
pub fn encode_block_record(
    deleted: bool,
    id: u32,
    seq: u32,
    owner: u32,
    data_len: u32,
) -> [u8; BLOCK_RECORD_LEN] {
    let mut buf = [0u8; BLOCK_RECORD_LEN];
    buf[0] = RecordTag::BLOCK;
    let mut flags = 0u8;
    if deleted {
        flags |= 0b0000_0001;
    }
    buf[1] = flags;
    buf[4..8].copy_from_slice(&id.to_be_bytes());
    buf[8..12].copy_from_slice(&seq.to_be_bytes());
    buf[12..16].copy_from_slice(&owner.to_be_bytes());
    buf[16..20].copy_from_slice(&data_len.to_be_bytes());
    buf[2] = crc8(&buf[3..]);
    buf
}

/// Reads and validates the header of the area behind `handle`.
///
/// Returns `Err` for any region that does not carry a valid header
/// (wrong magic, unreadable) — the area detector treats that as "not a
/// formatted area" and skips the region, not a fatal error.
pub fn decode_area_header<F: Flash>(
    handle: &AreaHandle,
    flash: &F,
) -> Result<crate::area::AreaHeader, RestoreError> {
    let mut buf = [0u8; AREA_HEADER_LEN];
    read_bounded(flash, handle, 0, &mut buf)?;

    let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != AREA_MAGIC {
        return Err(RestoreError::Corrupt("bad area magic"));
    }
    let id = u16::from_be_bytes([buf[4], buf[5]]);
    let gc_seq = u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]);

    Ok(crate::area::AreaHeader {
        id: AreaId(id),
        gc_seq,
    })
}

/// Peeks the tag byte at `offset` without consuming a full record. Used by
/// the scanner to decide which decoder to dispatch to, and to recognize
/// erased flash (end of log) before attempting a full-record read that would
/// otherwise run past the area bound.
pub fn peek_tag<F: Flash>(
    handle: &AreaHandle,
    flash: &F,
    offset: u32,
) -> Result<u8, RestoreError> {
    let mut b = [0u8; 1];
    read_bounded(flash, handle, offset, &mut b)?;
    Ok(b[0])
}

pub fn tag_at(byte: u8) -> Option<RecordTag> {
    RecordTag::from_byte(byte)
}

/// Decodes the inode record at `offset`. `offset` must point at the tag
/// byte; the caller (the scanner) is responsible for having already peeked
/// it as `RecordTag::Inode`.
pub fn decode_inode_record<F: Flash>(
    handle: &AreaHandle,
    flash: &F,
    offset: u32,
) -> Result<InodeRecord, RestoreError> {
    let mut buf = [0u8; INODE_RECORD_LEN];
    read_bounded(flash, handle, offset, &mut buf)?;

    if buf[0] != RecordTag::INODE {
        return Err(RestoreError::Corrupt("inode record tag mismatch"));
    }
    let flags = buf[1];
    let csum = buf[2];
    let namelen = buf[3] as usize;

    if crc8(&buf[3..]) != csum {
        return Err(RestoreError::Corrupt("inode record checksum"));
    }
    if namelen > MAX_FILENAME {
        return Err(RestoreError::Corrupt("inode name too long"));
    }

    let id = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let seq = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let parent = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);

    let mut name = arrayvec::ArrayVec::new();
    name.try_extend_from_slice(&buf[16..16 + namelen])
        .map_err(|_| RestoreError::Corrupt("inode name too long"))?;

    Ok(InodeRecord {
        directory: flags & 0b0000_0100 != 0,
        deleted: flags & 0b0000_0001 != 0,
        id,
        seq,
        parent,
        name,
    })
}

/// Decodes the block record header at `offset`. Does not read the payload;
/// callers that need the bytes read them separately via
/// [`crate::flash::read_bounded`] using `payload_offset`/`data_len`.
pub fn decode_block_record<F: Flash>(
    handle: &AreaHandle,
    flash: &F,
    offset: u32,
) -> Result<BlockRecord, RestoreError> {
    let mut buf = [0u8; BLOCK_RECORD_LEN];
    read_bounded(flash, handle, offset, &mut buf)?;

    if buf[0] != RecordTag::BLOCK {
        return Err(RestoreError::Corrupt("block record tag mismatch"));
    }
    let flags = buf[1];
    let csum = buf[2];

    if crc8(&buf[3..]) != csum {
        return Err(RestoreError::Corrupt("block record checksum"));
    }

    let id = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let seq = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let owner = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
    let data_len = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);

    Ok(BlockRecord {
        deleted: flags & 0b0000_0001 != 0,
        id,
        seq,
        owner,
        data_len,
        payload_offset: offset + BLOCK_RECORD_LEN as u32,
    })
}
