//! Restore/mount subsystem for a small log-structured flash filesystem.
//!
//! [`mount::restore`] is the single entry point: given a [`flash::Flash`]
//! implementation and a [`mount::RestoreConfig`], it scans every area,
//! reconstructs the in-memory object graph, repairs a crashed-GC twin if one
//! is present, sweeps anything left unresolved, validates the result, and
//! hands back an owned [`mount::Filesystem`] handle. Nothing here ever
//! writes to the device.
#![no_std]

extern crate alloc;

pub mod area;
pub mod codec;
pub mod error;
pub mod flash;
pub mod hashindex;
pub mod mock;
pub mod mount;
pub mod objects;
pub mod pool;
pub mod recover;
pub mod reconstruct;
pub mod scanner;
pub mod store;
pub mod sweep;
pub mod validate;

pub use error::RestoreError;
pub use mount::{restore, Filesystem, RestoreConfig};
pub use objects::{Block, Inode, ObjectId, ROOT_ID};
