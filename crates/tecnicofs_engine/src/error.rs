//! Internal failure kinds for namespace operations (spec §7).
//!
//! Every [`crate::Namespace`] operation returns one of these; the
//! dispatcher collapses any `Err` to the wire-level `FAIL` sentinel.
//! This mirrors `kernel/src/error.rs`'s single `thiserror::Error` enum
//! sitting at the boundary between internal errors and an over-the-wire
//! status code.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OpError {
    #[error("no such path")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("name already exists")]
    AlreadyExists,
    #[error("inode table exhausted")]
    TableFull,
    #[error("directory is full")]
    DirectoryFull,
    #[error("directory is not empty")]
    DirectoryNotEmpty,
    #[error("destination is inside the source subtree")]
    SelfContainment,
    #[error("invalid path")]
    InvalidPath,
    #[error("lock is currently held")]
    LockContended,
    #[error("operation would need to hold more locks than the table has slots")]
    TooManyHeldLocks,
}

/// The universal wire-level failure sentinel (spec §3, §7): a negative
/// `i32`. `SUCCESS`-shaped operations report `0` or a non-negative
/// inumber instead.
pub const FAIL: i32 = -1;
