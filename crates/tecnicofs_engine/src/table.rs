//! The inode table (C1) and its per-slot reader-writer locks (C2).
//!
//! There is no process-global table: per spec.md §9's own recommendation,
//! the table lives behind an explicit `Namespace` handle the dispatcher
//! threads through every request as an `Arc`, rather than a `static`
//! (contrast `kernel/src/fs/inode/table.rs`'s `static INODE_TABLE`, which
//! is forced on the teacher by being the kernel's one and only
//! filesystem).

use std::sync::{RwLock, RwLockWriteGuard, TryLockError};

use tecnicofs_types::{INODE_TABLE_SIZE, Inumber, NodeType};

use crate::{directory::Directory, error::OpError, slot::SlotState};

pub struct Namespace {
    slots: Vec<RwLock<SlotState>>,
}

impl Namespace {
    /// Builds an empty namespace with `ROOT` already allocated as an
    /// empty directory (spec.md invariant 1).
    #[must_use]
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(INODE_TABLE_SIZE);
        slots.push(RwLock::new(SlotState::Directory(Directory::new())));
        for _ in 1..INODE_TABLE_SIZE {
            slots.push(RwLock::new(SlotState::Free));
        }
        Self { slots }
    }

    pub(crate) fn slot(&self, inumber: Inumber) -> &RwLock<SlotState> {
        &self.slots[inumber.as_index()]
    }

    /// Tries to acquire `inumber`'s write lock without blocking (C2's
    /// "try-acquire variant"). Returns a distinguishable failure if the
    /// lock is currently held by anyone, including the caller itself.
    pub fn try_lock_write(&self, inumber: Inumber) -> Result<RwLockWriteGuard<'_, SlotState>, OpError> {
        match self.slot(inumber).try_write() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(OpError::LockContended),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    /// Finds the lowest-indexed free slot, allocates it as `node_type`,
    /// and returns its inumber (spec.md §4.1: "Allocation policy is
    /// deterministic (lowest free index)").
    ///
    /// Scans with `try_write` rather than a blocking acquire: a slot the
    /// *current* operation already holds (as an ancestor on its own
    /// traversal path) is necessarily occupied, so a momentary
    /// "would-block" on it is equivalent to skipping an occupied slot,
    /// and this keeps allocation from ever deadlocking against locks the
    /// caller is already holding.
    pub fn allocate(&self, node_type: NodeType) -> Result<Inumber, OpError> {
        for (index, slot) in self.slots.iter().enumerate() {
            let mut guard = match slot.try_write() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => continue,
            };
            if matches!(*guard, SlotState::Free) {
                *guard = match node_type {
                    NodeType::Directory => SlotState::Directory(Directory::new()),
                    NodeType::File => SlotState::File,
                };
                return Ok(Inumber::new(index));
            }
        }
        Err(OpError::TableFull)
    }

    /// Releases a just-allocated, not-yet-reachable slot back to `FREE`.
    ///
    /// Used only to compensate a `create`/`move` that allocated a child
    /// but then failed to link it into a directory (spec.md §7: "no
    /// partial mutation is ever visible on a `FAIL` return"). Nothing
    /// else can be holding this slot's lock, since it was never inserted
    /// into any directory entry and so is unreachable by any concurrent
    /// traversal.
    pub fn free(&self, inumber: Inumber) {
        let mut guard = self
            .slot(inumber)
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = SlotState::Free;
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tecnicofs_types::{INODE_TABLE_SIZE, Inumber, NodeType};

    use super::Namespace;
    use crate::error::OpError;

    #[test]
    fn root_preallocated_as_directory() {
        let ns = Namespace::new();
        let guard = ns.slot(Inumber::ROOT).read().unwrap();
        assert_eq!(guard.node_type(), Some(NodeType::Directory));
    }

    #[test]
    fn allocation_is_lowest_free_index_and_deterministic() {
        let ns = Namespace::new();
        let a = ns.allocate(NodeType::File).unwrap();
        let b = ns.allocate(NodeType::File).unwrap();
        assert_eq!(a, Inumber::new(1));
        assert_eq!(b, Inumber::new(2));
        ns.free(a);
        let c = ns.allocate(NodeType::File).unwrap();
        assert_eq!(c, Inumber::new(1));
    }

    #[test]
    fn table_exhaustion_then_recovery() {
        let ns = Namespace::new();
        for _ in 1..INODE_TABLE_SIZE {
            ns.allocate(NodeType::File).unwrap();
        }
        assert_eq!(ns.allocate(NodeType::File), Err(OpError::TableFull));
        ns.free(Inumber::new(5));
        assert!(ns.allocate(NodeType::File).is_ok());
    }

    #[test]
    fn try_lock_write_reports_contention() {
        let ns = Namespace::new();
        let _guard = ns.slot(Inumber::ROOT).write().unwrap();
        assert!(matches!(
            ns.try_lock_write(Inumber::ROOT),
            Err(OpError::LockContended)
        ));
    }
}
