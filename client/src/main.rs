//! A thin CLI over [`tecnicofs_client`], for manual smoke testing and
//! for driving the end-to-end integration tests.
//!
//! Grounded on `original_source/main.c`'s batch-command test harness
//! (`run`, reproduced here) and on the teacher's `mkfs`/`user/src/bin`
//! host-binary shape for everything else (one `clap` subcommand per
//! mode, structured logging instead of bare `printf`).

use std::{
    io::{self, BufRead, Write as _},
    process,
    time::Instant,
};

use clap::{Parser, Subcommand};
use tecnicofs_client::Session;
use tecnicofs_proto::parse;

#[derive(Parser, Debug)]
#[command(name = "tecnicofs-client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read commands one per line from `commands_file`, send each to
    /// the server in order, and report a running count plus a timing
    /// summary when the file is exhausted (`original_source/main.c`'s
    /// batch-command mode).
    Run {
        commands_file: String,
        server_socket_path: String,
    },
    /// Read commands one per line from stdin, printing each reply as it
    /// arrives. Useful for interactive, manual exploration.
    Interactive { server_socket_path: String },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Run {
            commands_file,
            server_socket_path,
        } => run_batch(&commands_file, &server_socket_path),
        Command::Interactive { server_socket_path } => run_interactive(&server_socket_path),
    };

    process::exit(exit_code);
}

fn run_batch(commands_file: &str, server_socket_path: &str) -> i32 {
    let contents = match std::fs::read_to_string(commands_file) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("error: couldn't read {commands_file}: {err}");
            return 1;
        }
    };
    let session = match Session::mount(server_socket_path) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("error: couldn't mount tecnicofs client: {err}");
            return 1;
        }
    };

    let start = Instant::now();
    let mut processed = 0u64;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request = match parse(line.as_bytes()) {
            Ok(request) => request,
            Err(err) => {
                log::warn!("skipping malformed command {line:?}: {err}");
                continue;
            }
        };
        match session.execute(&request) {
            Ok(status) => log::info!("{request} -> {status}"),
            Err(err) => log::error!("{request} failed: {err}"),
        }
        processed += 1;
    }
    let elapsed = start.elapsed();
    log::info!("processed {processed} commands in {elapsed:.2?}");
    0
}

fn run_interactive(server_socket_path: &str) -> i32 {
    let session = match Session::mount(server_socket_path) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("error: couldn't mount tecnicofs client: {err}");
            return 1;
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse(line.as_bytes()) {
            Ok(request) => match session.execute(&request) {
                Ok(status) => {
                    let _ = writeln!(stdout, "{status}");
                }
                Err(err) => eprintln!("error: {err}"),
            },
            Err(err) => eprintln!("error: {err}"),
        }
    }
    0
}
