//! End-to-end scenarios (spec.md §8's "End-to-end scenarios" and
//! "Concurrency"/"Print barrier" boundaries), driven against a real
//! `tecnicofs-server` subprocess through the `tecnicofs_client` library.

mod support;

use std::{collections::HashSet, thread};

use support::TestServer;
use tecnicofs_types::NodeType;

#[test]
fn creation_and_lookup() {
    let server = TestServer::spawn(2);
    let client = server.session();

    client.create("/a", NodeType::Directory).unwrap();
    client.create("/a/b", NodeType::File).unwrap();

    assert!(client.lookup("/a/b").is_ok());
    assert!(client.lookup("/a/c").is_err());
}

#[test]
fn deletion_guard() {
    let server = TestServer::spawn(2);
    let client = server.session();

    client.create("/x", NodeType::Directory).unwrap();
    client.create("/x/y", NodeType::File).unwrap();

    assert!(client.delete("/x").is_err(), "non-empty directory must refuse deletion");
    client.delete("/x/y").unwrap();
    client.delete("/x").unwrap();
}

#[test]
fn move_across_directories() {
    let server = TestServer::spawn(2);
    let client = server.session();

    client.create("/src", NodeType::Directory).unwrap();
    client.create("/src/f", NodeType::File).unwrap();
    client.create("/dst", NodeType::Directory).unwrap();
    let original = client.lookup("/src/f").unwrap();

    client.mv("/src/f", "/dst/f").unwrap();

    assert!(client.lookup("/src/f").is_err());
    assert_eq!(client.lookup("/dst/f").unwrap(), original);
}

#[test]
fn move_self_containment_leaves_state_unchanged() {
    let server = TestServer::spawn(2);
    let client = server.session();

    client.create("/a", NodeType::Directory).unwrap();
    client.create("/a/b", NodeType::Directory).unwrap();

    assert!(client.mv("/a", "/a/b/a").is_err());
    assert!(client.lookup("/a").is_ok());
    assert!(client.lookup("/a/b").is_ok());
}

#[test]
fn concurrent_creates_under_root_all_succeed_with_unique_names() {
    let server = TestServer::spawn(8);

    const N: usize = 64;
    let handles: Vec<_> = (0..N)
        .map(|i| {
            let session = server.session();
            thread::spawn(move || {
                session
                    .create(&format!("/k{i}"), NodeType::File)
                    .expect("concurrent create of a distinct name must succeed");
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let verifier = server.session();
    let mut seen = HashSet::new();
    for i in 0..N {
        let inumber = verifier
            .lookup(&format!("/k{i}"))
            .unwrap_or_else(|_| panic!("/k{i} must exist after quiescence"));
        assert!(seen.insert(inumber), "no inumber may be assigned twice");
    }
}

#[test]
fn print_barrier_serializes_against_concurrent_mutation() {
    let server = TestServer::spawn(8);
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("snapshot.txt");

    let mutators: Vec<_> = (0..16)
        .map(|i| {
            let session = server.session();
            thread::spawn(move || {
                let _ = session.create(&format!("/m{i}"), NodeType::File);
                let _ = session.delete(&format!("/m{i}"));
            })
        })
        .collect();

    let printer = server.session();
    printer.print(snapshot_path.to_str().unwrap()).unwrap();

    for handle in mutators {
        handle.join().unwrap();
    }

    let contents = std::fs::read_to_string(&snapshot_path).unwrap();
    assert!(contents.starts_with("d /\n"), "snapshot must always show a rooted directory");
    for line in contents.lines().skip(1) {
        let trimmed = line.trim_start();
        assert!(
            trimmed.starts_with("d ") || trimmed.starts_with("f "),
            "every non-root line must carry a type tag: {line:?}"
        );
    }
}

#[test]
fn directory_capacity_boundary() {
    let server = TestServer::spawn(2);
    let client = server.session();

    for i in 0..tecnicofs_types::MAX_DIR_ENTRIES {
        client.create(&format!("/n{i}"), NodeType::File).unwrap();
    }
    assert!(client.create("/overflow", NodeType::File).is_err());
    client.delete("/n0").unwrap();
    client.create("/overflow", NodeType::File).unwrap();
}

#[test]
fn lookup_is_side_effect_free() {
    let server = TestServer::spawn(2);
    let client = server.session();

    client.create("/a", NodeType::Directory).unwrap();
    client.create("/a/b", NodeType::File).unwrap();

    let before = client.lookup("/a/b").unwrap();
    for _ in 0..10 {
        client.lookup("/a").unwrap();
        client.lookup("/a/b").unwrap();
        client.lookup("/missing").unwrap_err();
    }
    assert_eq!(client.lookup("/a/b").unwrap(), before);
}
