//! The request dispatcher (C6): the worker-pool loop that reads a
//! request, coordinates the print barrier, invokes a namespace
//! operation, and replies (spec.md §4.5).
//!
//! Grounded on `original_source/main.c`'s `applyCommands` loop, adapted
//! per `SPEC_FULL.md`'s resolution of the §9 open question: a malformed
//! request is rejected with `FAIL` and logged, not fatal to the server.

use std::{
    fs::File,
    net::Shutdown,
    os::unix::net::{SocketAddr, UnixDatagram},
    sync::Arc,
};

use tecnicofs_engine::{FAIL, Namespace, print_tree};
use tecnicofs_proto::{Reply, Request, parse};
use tecnicofs_types::MAX_INPUT_SIZE;

use crate::barrier::PrintBarrier;

/// One worker's share of shared server state, cheap to clone (every
/// field is an `Arc` or a socket clone).
#[derive(Clone)]
pub struct Shared {
    pub namespace: Arc<Namespace>,
    pub barrier: Arc<PrintBarrier>,
    pub socket: Arc<UnixDatagram>,
}

/// Runs one worker's receive loop. Never returns under normal operation
/// (spec.md §5: "Requests have no deadline"); returns only if the
/// shared socket itself errors out from under it.
pub fn worker_loop(worker_id: usize, shared: &Shared) {
    let mut buf = [0u8; MAX_INPUT_SIZE];
    loop {
        let (len, from) = match shared.socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(err) => {
                log::error!("worker {worker_id}: recv failed: {err}");
                continue;
            }
        };
        if len == 0 {
            continue;
        }

        let request = match parse(&buf[..len]) {
            Ok(request) => request,
            Err(err) => {
                log::warn!("worker {worker_id}: rejected malformed request: {err}");
                reply_to(&shared.socket, &from, Reply::FAIL);
                continue;
            }
        };

        log::trace!("worker {worker_id}: accepted {request}");
        let is_print = matches!(request, Request::Print { .. });

        let admission = shared.barrier.enter(is_print);
        if is_print {
            log::debug!("worker {worker_id}: print barrier opened");
        }

        let reply = execute(&shared.namespace, &request);

        if is_print {
            admission.finish_print();
            log::debug!("worker {worker_id}: print barrier closed");
        }

        reply_to(&shared.socket, &from, reply);
        drop(admission);
    }
}

/// Executes one request's namespace operation.
///
/// A panic here (a lock/mutex failure — spec.md §7's "programmer
/// invariant violation" class) is deliberately not caught: the
/// workspace-wide `panic = "abort"` profile setting (matching the
/// teacher's own `Cargo.toml`) turns it into the whole process
/// terminating, per spec.md §7's "the process terminates" requirement,
/// rather than papering over it as a per-request `FAIL`.
fn execute(namespace: &Namespace, request: &Request) -> Reply {
    match request {
        Request::Create { path, node_type } => match namespace.create(path, *node_type) {
            Ok(_) => Reply(0),
            Err(err) => {
                log::trace!("create {path:?} failed: {err}");
                Reply::FAIL
            }
        },
        Request::Delete { path } => match namespace.delete(path) {
            Ok(()) => Reply(0),
            Err(err) => {
                log::trace!("delete {path:?} failed: {err}");
                Reply::FAIL
            }
        },
        Request::Lookup { path } => match namespace.lookup(path) {
            Ok(inumber) => Reply(i32::try_from(inumber.as_index()).unwrap_or(FAIL)),
            Err(err) => {
                log::trace!("lookup {path:?} failed: {err}");
                Reply::FAIL
            }
        },
        Request::Move { from, to } => match namespace.mv(from, to) {
            Ok(()) => Reply(0),
            Err(err) => {
                log::trace!("move {from:?} -> {to:?} failed: {err}");
                Reply::FAIL
            }
        },
        Request::Print { out_file } => match File::create(out_file)
            .and_then(|mut file| print_tree(namespace, &mut file))
        {
            Ok(()) => Reply(0),
            Err(err) => {
                log::error!("print to {out_file:?} failed: {err}");
                Reply::FAIL
            }
        },
    }
}

fn reply_to(socket: &UnixDatagram, to: &SocketAddr, reply: Reply) {
    let Some(path) = to.as_pathname() else {
        log::error!("client datagram had no source path, cannot reply");
        return;
    };
    if let Err(err) = socket.send_to(&reply.to_bytes(), path) {
        log::warn!("failed to send reply to {}: {err}", path.display());
    }
}

/// Shuts the shared socket down; used by tests to unblock a worker
/// that's parked in `recv_from`.
pub fn shutdown(socket: &UnixDatagram) {
    let _ = socket.shutdown(Shutdown::Both);
}
