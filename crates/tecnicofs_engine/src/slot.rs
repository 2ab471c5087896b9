//! The contents an inode table slot (C1) can hold (spec.md §3's
//! `type`/`data` pair, minus the lock, which the table wraps each slot
//! in separately).

use tecnicofs_types::NodeType;

use crate::directory::Directory;

#[derive(Debug, Clone)]
pub enum SlotState {
    /// Unallocated, reusable slot (the spec's `FREE` sentinel, modeled
    /// as a variant rather than a magic inumber).
    Free,
    Directory(Directory),
    File,
}

impl SlotState {
    #[must_use]
    pub fn node_type(&self) -> Option<NodeType> {
        match self {
            Self::Free => None,
            Self::Directory(_) => Some(NodeType::Directory),
            Self::File => Some(NodeType::File),
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Self::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match self {
            Self::Directory(dir) => Some(dir),
            _ => None,
        }
    }
}
