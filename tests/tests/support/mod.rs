//! Shared harness for the end-to-end tests: spawns a real
//! `tecnicofs-server` subprocess on its own socket path and gives each
//! test a way to mount client sessions against it.
//!
//! Grounded on the `assert_cmd`-based subprocess harnesses seen across
//! the retrieved example pack (`assert_cmd::cargo::cargo_bin` locates
//! the compiled binary without assuming it shares this crate's
//! package), composed with `tecnicofs_client::Session` for the actual
//! protocol exchange.

use std::{
    path::PathBuf,
    process::{Child, Command},
    sync::atomic::{AtomicU64, Ordering},
    thread,
    time::{Duration, Instant},
};

use tecnicofs_client::Session;

pub struct TestServer {
    child: Child,
    socket_path: PathBuf,
}

impl TestServer {
    /// Spawns a server with `threads` worker threads on a fresh socket
    /// path and blocks until it has bound it.
    #[must_use]
    pub fn spawn(threads: usize) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let socket_path = std::env::temp_dir().join(format!(
            "tecnicofs-test-{}-{id}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&socket_path);

        let child = Command::new(assert_cmd::cargo::cargo_bin("tecnicofs-server"))
            .arg(threads.to_string())
            .arg(&socket_path)
            .env("RUST_LOG", "warn")
            .spawn()
            .expect("failed to spawn tecnicofs-server");

        let server = Self { child, socket_path };
        server.wait_for_socket();
        server
    }

    fn wait_for_socket(&self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.socket_path.exists() {
                return;
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!(
            "tecnicofs-server never bound its socket at {}",
            self.socket_path.display()
        );
    }

    /// Mounts a fresh client session against this server. Cheap enough
    /// to call once per logical client in a concurrency test.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::mount(&self.socket_path).expect("failed to mount client session")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
