//! The tree printer (C7): a deterministic pre-order DFS serialization of
//! the reachable tree (spec.md §4.6, format fixed in `SPEC_FULL.md` §9).
//!
//! Runs outside any per-inode lock. Safe only because the dispatcher's
//! print barrier (C6) guarantees no writer is active for the duration —
//! `print_tree` itself takes each node's read lock only transiently, one
//! node at a time, never coupling parent and child locks the way C4's
//! traversal does, since there is nothing concurrent to couple against.

use std::io::{self, Write};

use tecnicofs_types::Inumber;

use crate::{slot::SlotState, table::Namespace};

/// Writes the tree rooted at `ROOT` to `out`.
///
/// Each inode is one line: two spaces per depth level, a `d`/`f` type
/// tag, a space, and the name (`/` for root). Children follow their
/// parent immediately, in entry-array order, depth-first.
pub fn print_tree<W: Write>(ns: &Namespace, out: &mut W) -> io::Result<()> {
    write_node(ns, out, Inumber::ROOT, "/", 0)
}

fn write_node<W: Write>(
    ns: &Namespace,
    out: &mut W,
    inumber: Inumber,
    name: &str,
    depth: usize,
) -> io::Result<()> {
    let guard = ns
        .slot(inumber)
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let tag = match &*guard {
        SlotState::Directory(_) => 'd',
        SlotState::File => 'f',
        SlotState::Free => {
            // Reachable only via a directory entry, and entries are
            // always cleared in the same write that frees a slot, so a
            // live entry can never point at a `Free` slot.
            unreachable!("print reached a FREE slot through a live directory entry")
        }
    };
    writeln!(out, "{}{tag} {name}", "  ".repeat(depth))?;

    let children: Vec<(Inumber, String)> = match &*guard {
        SlotState::Directory(dir) => dir.iter().map(|e| (e.inumber, e.name.clone())).collect(),
        SlotState::File | SlotState::Free => Vec::new(),
    };
    drop(guard);

    for (child_inumber, child_name) in children {
        write_node(ns, out, child_inumber, &child_name, depth + 1)?;
    }
    Ok(())
}
