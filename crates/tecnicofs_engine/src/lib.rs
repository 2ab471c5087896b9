//! The concurrent namespace engine: C1-C5 and C7 of the tecnicofs
//! specification — the inode table, per-inode reader-writer locks,
//! directory entries, the lock-coupling path resolver, the namespace
//! operations built on top of it, and the tree printer.
//!
//! What C6 (the request dispatcher, in the `server` crate) drives: every
//! public [`Namespace`] method here takes no lock itself on entry or
//! exit beyond what it acquires and releases internally, so the
//! dispatcher's print barrier is the only synchronization the caller
//! needs to reason about across requests.

mod directory;
mod error;
mod ops;
mod path;
mod print;
mod slot;
mod table;

pub use error::{FAIL, OpError};
pub use print::print_tree;
pub use table::Namespace;
pub use tecnicofs_types::{Inumber, NodeType};
