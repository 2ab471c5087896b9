//! The client stub library (spec.md §6's "uninteresting plumbing",
//! made concrete per `SPEC_FULL.md` §6).
//!
//! Ported from `original_source/client/tecnicofs-client-api.c`'s
//! `tfsMount`/`tfsCreate`/.../`tfsUnmount`, one socket per client
//! process, to an idiomatic Rust `Session` over
//! `std::os::unix::net::UnixDatagram` whose `Drop` does what
//! `tfsUnmount` did by hand.

use std::{
    io,
    os::unix::net::UnixDatagram,
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicU64, Ordering},
};

use tecnicofs_proto::{Reply, Request, parse};
use tecnicofs_types::{NameError, NodeType, validate_name};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("i/o error talking to the server: {0}")]
    Io(#[from] io::Error),
    #[error("server replied with a malformed datagram")]
    MalformedReply,
    #[error("invalid path component: {0}")]
    InvalidName(#[from] NameError),
    #[error("operation failed")]
    Failed,
}

/// Last `/`-separated, non-empty component of `path`, or the whole
/// path if it has none. Mirrors the split `create`/`delete`/`move`
/// perform server-side, just enough to validate before sending.
fn last_component(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

/// A mounted client connection to a tecnicofs server (spec.md §6).
///
/// Binds its own client-side socket path (`original_source`'s
/// `/tmp/<pid>` scheme) on [`Session::mount`] and removes it again on
/// [`Drop`], so a client that simply goes out of scope cleans up after
/// itself the same way the original's explicit `tfsUnmount` did.
pub struct Session {
    socket: UnixDatagram,
    client_socket_path: PathBuf,
}

impl Session {
    /// `tfsMount` (spec.md §6, `original_source/client
    /// /tecnicofs-client-api.c`'s `tfsMount`).
    pub fn mount(server_socket_path: impl AsRef<Path>) -> Result<Self, ClientError> {
        // The original keyed this path on the client process's pid
        // alone, since it only ever ran one `Session` per process. A
        // test binary mounts many concurrently from a single pid, so a
        // per-session counter is folded in to keep the paths distinct.
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let client_socket_path =
            PathBuf::from(format!("/tmp/tecnicofs-client-{}-{id}", process::id()));
        // Clears a stale socket file from a previous run with the same
        // pid, the same way the original unconditionally `unlink`s
        // before binding.
        let _ = std::fs::remove_file(&client_socket_path);

        let socket = UnixDatagram::bind(&client_socket_path)?;
        socket.connect(server_socket_path.as_ref())?;
        log::debug!(
            "mounted tecnicofs client at {} -> {}",
            client_socket_path.display(),
            server_socket_path.as_ref().display()
        );
        Ok(Self {
            socket,
            client_socket_path,
        })
    }

    /// Sends an already-parsed request and returns the raw reply
    /// status, without interpreting it as success/failure. Used by the
    /// `client` CLI's batch mode, which dispatches whatever a commands
    /// file contains without knowing its shape up front.
    pub fn execute(&self, request: &Request) -> Result<i32, ClientError> {
        self.call(request)
    }

    fn call(&self, request: &Request) -> Result<i32, ClientError> {
        let encoded = request.encode();
        self.socket.send(&encoded)?;
        let mut buf = [0u8; 4];
        let n = self.socket.recv(&mut buf)?;
        let reply = Reply::from_bytes(&buf[..n]).ok_or(ClientError::MalformedReply)?;
        Ok(reply.0)
    }

    /// `tfsCreate`.
    pub fn create(&self, path: &str, node_type: NodeType) -> Result<(), ClientError> {
        validate_name(last_component(path))?;
        let status = self.call(&Request::Create {
            path: path.to_owned(),
            node_type,
        })?;
        if status >= 0 { Ok(()) } else { Err(ClientError::Failed) }
    }

    /// `tfsDelete`.
    pub fn delete(&self, path: &str) -> Result<(), ClientError> {
        let status = self.call(&Request::Delete {
            path: path.to_owned(),
        })?;
        if status >= 0 { Ok(()) } else { Err(ClientError::Failed) }
    }

    /// `tfsLookup`. Returns the resolved inumber on success.
    pub fn lookup(&self, path: &str) -> Result<i32, ClientError> {
        let status = self.call(&Request::Lookup {
            path: path.to_owned(),
        })?;
        if status >= 0 { Ok(status) } else { Err(ClientError::Failed) }
    }

    /// `tfsMove`.
    pub fn mv(&self, from: &str, to: &str) -> Result<(), ClientError> {
        let status = self.call(&Request::Move {
            from: from.to_owned(),
            to: to.to_owned(),
        })?;
        if status >= 0 { Ok(()) } else { Err(ClientError::Failed) }
    }

    /// `tfsPrint`.
    pub fn print(&self, out_file: &str) -> Result<(), ClientError> {
        let status = self.call(&Request::Print {
            out_file: out_file.to_owned(),
        })?;
        if status >= 0 { Ok(()) } else { Err(ClientError::Failed) }
    }

    /// `tfsUnmount`. Equivalent to letting `self` drop, spelled out for
    /// callers that want to observe cleanup errors.
    pub fn unmount(self) -> Result<(), ClientError> {
        let path = self.client_socket_path.clone();
        drop(self);
        std::fs::remove_file(path).or_else(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(ClientError::Io(e))
            }
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.client_socket_path) {
            if err.kind() != io::ErrorKind::NotFound {
                log::warn!(
                    "failed to remove client socket {}: {err}",
                    self.client_socket_path.display()
                );
            }
        }
    }
}

/// Parses a raw reply datagram; exposed for the `client` CLI's
/// interactive mode, which prints the raw wire text it sent.
pub fn parse_request(datagram: &[u8]) -> Result<Request, tecnicofs_proto::ParseError> {
    parse(datagram)
}

#[cfg(test)]
mod tests {
    use super::last_component;

    #[test]
    fn last_component_of_nested_path() {
        assert_eq!(last_component("/a/b/c"), "c");
    }

    #[test]
    fn last_component_tolerates_trailing_slash() {
        assert_eq!(last_component("/a/b/"), "b");
    }

    #[test]
    fn last_component_of_top_level_path() {
        assert_eq!(last_component("/a"), "a");
    }
}
