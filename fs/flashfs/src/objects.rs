//! The in-RAM data model: objects, inodes, blocks and their flags.
//!
//! Mirrors spec §3 verbatim. Parent and owner back-edges are stored as
//! [`ObjectId`]s and resolved through the hash index on demand rather than as
//! direct references, so the sweeper can remove an object without having to
//! chase anything pointing at it (see `DESIGN.md`, "weak back-edges").

use crate::area::AreaIndex;
use crate::store::Identified;
use arrayvec::ArrayVec;
use bitflags::bitflags;

/// Maximum inline filename length, in bytes.
pub const MAX_FILENAME: usize = 32;

/// The reserved id of the root directory inode.
///
/// The codec identifies "this is the root inode" by id rather than by a
/// dedicated flag bit, the same convention `keos-project5`'s
/// `FastFileSystem::ROOT_INODE_NUMBER` uses for its own root inode.
pub const ROOT_ID: ObjectId = ObjectId(1);

/// A stable object identifier, unique within its own type's id-space.
///
/// `ObjectId(0)` is the `NONE` sentinel: "no parent", "no owner", or "record
/// not yet assigned an id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The sentinel value meaning "no such reference."
    pub const NONE: ObjectId = ObjectId(0);

    /// Whether this id is the `NONE` sentinel.
    #[inline]
    pub fn is_none(self) -> bool {
        self == ObjectId::NONE
    }
}

bitflags! {
    /// Per-inode flag bits. `DIRECTORY` distinguishes a directory (with a
    /// child list) from a regular file (with a block list).
    #[derive(Default)]
    pub struct InodeFlags: u8 {
        /// The object has been unlinked but a record describing its removal
        /// is still present; swept on the next restore.
        const DELETED   = 0b0000_0001;
        /// Placeholder: referenced before its defining record was seen, or
        /// flagged suspect by the corruption recoverer. Swept if never
        /// resolved.
        const DUMMY     = 0b0000_0010;
        /// Directory (has a child list); absent means regular file (has a
        /// block list).
        const DIRECTORY = 0b0000_0100;
    }
}

bitflags! {
    /// Per-block flag bits.
    #[derive(Default)]
    pub struct BlockFlags: u8 {
        /// See [`InodeFlags::DELETED`].
        const DELETED = 0b0000_0001;
        /// See [`InodeFlags::DUMMY`]. Nothing forward-references a block by
        /// id, so a block is never created as a dummy placeholder the way
        /// an inode is; kept for parity with the general data model (§3) and
        /// for a recoverer strategy that marks suspect content in place
        /// rather than excluding a whole area up front (see `DESIGN.md`).
        const DUMMY   = 0b0000_0010;
    }
}

/// An in-memory inode: a directory or a regular file.
#[derive(Debug, Clone)]
pub struct Inode {
    /// Stable id, unique among inodes.
    pub id: ObjectId,
    /// Sequence number of the disk record currently backing this inode.
    pub seq: u32,
    /// Area holding the record this inode was last built from. `AreaIndex::NONE`
    /// for a dummy placeholder that has never been backed by a real record.
    pub area: AreaIndex,
    /// Flag bitset.
    pub flags: InodeFlags,
    /// Reference count. Only ever 1 in this pipeline (restore never hard-links);
    /// kept because the data model in spec §3 is general.
    pub refcount: u32,
    /// Parent inode id, or `ObjectId::NONE` for the root (or an unresolved
    /// dummy that has not yet been linked anywhere).
    pub parent: ObjectId,
    /// Ids of child inodes, directory order as encountered during restore.
    pub children: alloc::vec::Vec<ObjectId>,
    /// Ids of blocks, in logical file order as encountered during restore.
    pub blocks: alloc::vec::Vec<ObjectId>,
    /// Inline, bounded filename.
    pub filename: ArrayVec<u8, MAX_FILENAME>,
}

impl Inode {
    /// Builds a fresh dummy directory placeholder for `id`, used when some
    /// other inode names `id` as its parent before `id`'s own record has
    /// been seen.
    pub fn dummy_directory(id: ObjectId) -> Self {
        Inode {
            id,
            seq: 0,
            area: AreaIndex::NONE,
            flags: InodeFlags::DUMMY | InodeFlags::DIRECTORY,
            refcount: 1,
            parent: ObjectId::NONE,
            children: alloc::vec::Vec::new(),
            blocks: alloc::vec::Vec::new(),
            filename: ArrayVec::new(),
        }
    }

    /// Builds a fresh dummy file placeholder for `id`, used when a block
    /// names `id` as its owner before `id`'s own record has been seen.
    pub fn dummy_file(id: ObjectId) -> Self {
        Inode {
            id,
            seq: 0,
            area: AreaIndex::NONE,
            flags: InodeFlags::DUMMY,
            refcount: 1,
            parent: ObjectId::NONE,
            children: alloc::vec::Vec::new(),
            blocks: alloc::vec::Vec::new(),
            filename: ArrayVec::new(),
        }
    }
}

impl Identified for Inode {
    fn object_id(&self) -> ObjectId {
        self.id
    }
}

/// An in-memory block: a chunk of file data living on flash.
///
/// The payload itself is never copied into RAM during restore; only its
/// location and length are tracked, per spec §3.
#[derive(Debug, Clone)]
pub struct Block {
    /// Stable id, unique among blocks.
    pub id: ObjectId,
    /// Sequence number of the disk record currently backing this block.
    pub seq: u32,
    /// Area holding this block's current record.
    pub area: AreaIndex,
    /// Flag bitset.
    pub flags: BlockFlags,
    /// Owning inode id. A block whose owner cannot be resolved is
    /// meaningless and is swept.
    pub owner: ObjectId,
    /// Length of the data payload, in bytes.
    pub data_len: u32,
    /// Byte offset of the payload within `area` (header-relative).
    pub offset: u32,
}

impl Identified for Block {
    fn object_id(&self) -> ObjectId {
        self.id
    }
}
