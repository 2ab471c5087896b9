//! `server <numberThreads> <server_socket_path>` (spec.md §6).
//!
//! CLI parsing follows the teacher's `mkfs` in reaching for `clap`
//! rather than hand-rolling `std::env::args()` parsing, even though this
//! binary (like the original's `main.c`) takes only positional
//! arguments.

use std::{
    os::unix::net::UnixDatagram,
    process,
    sync::Arc,
    thread,
};

use clap::Parser;
use tecnicofs_engine::Namespace;

mod barrier;
mod dispatcher;

use barrier::PrintBarrier;
use dispatcher::{Shared, worker_loop};

/// In-memory hierarchical namespace server (tecnicofs).
#[derive(Parser, Debug)]
#[command(name = "tecnicofs-server")]
struct Args {
    /// Number of worker threads in the dispatcher pool.
    number_threads: usize,

    /// Filesystem path of the server's Unix datagram socket.
    server_socket_path: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.number_threads == 0 {
        eprintln!("error: numberThreads must be greater than zero");
        process::exit(1);
    }

    let _ = std::fs::remove_file(&args.server_socket_path);
    let socket = match UnixDatagram::bind(&args.server_socket_path) {
        Ok(socket) => socket,
        Err(err) => {
            eprintln!(
                "error: couldn't bind server socket {}: {err}",
                args.server_socket_path
            );
            process::exit(1);
        }
    };

    log::info!(
        "tecnicofs server listening on {} with {} worker threads",
        args.server_socket_path,
        args.number_threads
    );

    let shared = Shared {
        namespace: Arc::new(Namespace::new()),
        barrier: Arc::new(PrintBarrier::new()),
        socket: Arc::new(socket),
    };

    let handles: Vec<_> = (0..args.number_threads)
        .map(|worker_id| {
            let shared = shared.clone();
            thread::spawn(move || worker_loop(worker_id, &shared))
        })
        .collect();

    // Workers never return under normal operation; joining keeps the
    // process alive without a busy `loop {}`, the same role
    // `pthread_join(thread_ids[0], NULL)` played in the original.
    for handle in handles {
        let _ = handle.join();
    }
}
