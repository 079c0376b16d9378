//! Error taxonomy for the restore/mount subsystem.

use core::fmt;

/// Errors that can escape the restore pipeline.
///
/// Several error categories exist purely inside the pipeline and never reach
/// a caller (an empty-record sentinel, an out-of-area read, a hash-index
/// miss that simply triggers dummy creation). Those are modeled as local
/// control flow in the modules that raise them rather than as variants here;
/// this enum only carries what [`crate::mount::restore`] can actually return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreError {
    /// The underlying flash device failed to service a read. Fatal: the
    /// mount is aborted and all process-wide state is reset.
    Flash,
    /// The on-disk image is internally inconsistent in a way recovery could
    /// not resolve (duplicate `(id, seq)`, an owner/parent mismatch on
    /// replace, an unrecoverable missing scratch area, or a failed
    /// validation check). Carries a short, static description for logs.
    Corrupt(&'static str),
    /// An object pool ran out of slots.
    Oom,
    /// An argument or on-disk value was well-formed but out of range for
    /// this build (e.g. a filename longer than the configured maximum).
    Invalid(&'static str),
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::Flash => write!(f, "flash read failed"),
            RestoreError::Corrupt(msg) => write!(f, "filesystem corrupted: {msg}"),
            RestoreError::Oom => write!(f, "object pool exhausted"),
            RestoreError::Invalid(msg) => write!(f, "invalid: {msg}"),
        }
    }
}
