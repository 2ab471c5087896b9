//! Wire protocol shared by the server dispatcher (C6) and the client
//! library: request parsing/framing and the reply encoding (spec.md §6).
//!
//! Kept in its own crate, the same way `ov6_syscall` sits between the
//! kernel's syscall handlers and `ov6_user_lib`'s wrappers so both sides
//! agree on one definition of the wire shape instead of each hand-rolling
//! it.

use std::fmt;

use tecnicofs_types::{MAX_INPUT_SIZE, NodeType};

/// A parsed request, independent of how it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Create { path: String, node_type: NodeType },
    Delete { path: String },
    Lookup { path: String },
    Move { from: String, to: String },
    Print { out_file: String },
}

impl Request {
    /// Single-character opcode, as it appears on the wire.
    #[must_use]
    pub const fn opcode(&self) -> char {
        match self {
            Self::Create { .. } => 'c',
            Self::Delete { .. } => 'd',
            Self::Lookup { .. } => 'l',
            Self::Move { .. } => 'm',
            Self::Print { .. } => 'p',
        }
    }

    fn line(&self) -> String {
        match self {
            Self::Create { path, node_type } => format!("c {path} {}", node_type.tag()),
            Self::Delete { path } => format!("d {path}"),
            Self::Lookup { path } => format!("l {path}"),
            Self::Move { from, to } => format!("m {from} {to}"),
            Self::Print { out_file } => format!("p {out_file}"),
        }
    }

    /// Encodes this request as the ASCII, NUL-terminated wire format
    /// `"<op> <arg1>[ <arg2>]"` (spec.md §6).
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.line();
        line.push('\0');
        line.into_bytes()
    }
}

/// Why a datagram could not be parsed into a [`Request`].
///
/// Spec.md §9 resolves the "malformed request" open question: this is
/// reported back to the offending client as `FAIL`, not treated as
/// fatal to the server (see `server`'s dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request is not valid UTF-8")]
    NotUtf8,
    #[error("request exceeds {MAX_INPUT_SIZE} bytes")]
    TooLong,
    #[error("empty request")]
    Empty,
    #[error("unknown opcode {0:?}")]
    UnknownOpcode(char),
    #[error("missing argument")]
    MissingArgument,
    #[error("invalid node type {0:?}, expected 'f' or 'd'")]
    InvalidNodeType(String),
    #[error("unexpected trailing argument")]
    TrailingArgument,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line())
    }
}

/// Parses one request datagram (spec.md §6: ASCII, up to
/// `MAX_INPUT_SIZE` bytes, NUL-terminated, `"<op> <arg1>[ <arg2>]"`).
///
/// A trailing NUL (or anything after it) is trimmed before parsing; the
/// caller need not strip it first.
pub fn parse(datagram: &[u8]) -> Result<Request, ParseError> {
    if datagram.len() > MAX_INPUT_SIZE {
        return Err(ParseError::TooLong);
    }
    let text = std::str::from_utf8(datagram).map_err(|_| ParseError::NotUtf8)?;
    let text = text.split('\0').next().unwrap_or("").trim();

    let mut parts = text.split_whitespace();
    let op = parts.next().ok_or(ParseError::Empty)?;
    let mut op_chars = op.chars();
    let (Some(opcode), None) = (op_chars.next(), op_chars.next()) else {
        return Err(ParseError::UnknownOpcode(op.chars().next().unwrap_or('\0')));
    };

    let request = match opcode {
        'c' => {
            let path = parts.next().ok_or(ParseError::MissingArgument)?;
            let ty = parts.next().ok_or(ParseError::MissingArgument)?;
            let node_type = match ty {
                "f" => NodeType::File,
                "d" => NodeType::Directory,
                other => return Err(ParseError::InvalidNodeType(other.to_owned())),
            };
            Request::Create {
                path: path.to_owned(),
                node_type,
            }
        }
        'd' => Request::Delete {
            path: parts.next().ok_or(ParseError::MissingArgument)?.to_owned(),
        },
        'l' => Request::Lookup {
            path: parts.next().ok_or(ParseError::MissingArgument)?.to_owned(),
        },
        'm' => {
            let from = parts.next().ok_or(ParseError::MissingArgument)?;
            let to = parts.next().ok_or(ParseError::MissingArgument)?;
            Request::Move {
                from: from.to_owned(),
                to: to.to_owned(),
            }
        }
        'p' => Request::Print {
            out_file: parts.next().ok_or(ParseError::MissingArgument)?.to_owned(),
        },
        other => return Err(ParseError::UnknownOpcode(other)),
    };

    if parts.next().is_some() {
        return Err(ParseError::TrailingArgument);
    }
    Ok(request)
}

/// The reply to a request: "exactly one 4-byte signed integer in host
/// byte order. `>= 0` on success ... negative for `FAIL`" (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply(pub i32);

impl Reply {
    pub const FAIL: Self = Self(-1);

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_ne_bytes()
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Self(i32::from_ne_bytes(arr)))
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }
}

#[cfg(test)]
mod tests {
    use tecnicofs_types::NodeType;

    use super::{ParseError, Reply, Request, parse};

    #[test]
    fn parses_create() {
        let req = parse(b"c /a/b f\0").unwrap();
        assert_eq!(
            req,
            Request::Create {
                path: "/a/b".to_owned(),
                node_type: NodeType::File,
            }
        );
    }

    #[test]
    fn parses_move() {
        let req = parse(b"m /a /b").unwrap();
        assert_eq!(
            req,
            Request::Move {
                from: "/a".to_owned(),
                to: "/b".to_owned(),
            }
        );
    }

    #[test]
    fn round_trips_through_encode() {
        let req = Request::Lookup {
            path: "/a/b/c".to_owned(),
        };
        let encoded = req.encode();
        let decoded = parse(&encoded).unwrap();
        assert_eq!(req, decoded);
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert_eq!(parse(b"x /a"), Err(ParseError::UnknownOpcode('x')));
    }

    #[test]
    fn rejects_missing_argument() {
        assert_eq!(parse(b"c /a"), Err(ParseError::MissingArgument));
    }

    #[test]
    fn rejects_bad_node_type() {
        assert!(matches!(
            parse(b"c /a x"),
            Err(ParseError::InvalidNodeType(_))
        ));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse(b""), Err(ParseError::Empty));
        assert_eq!(parse(b"\0"), Err(ParseError::Empty));
    }

    #[test]
    fn reply_round_trips_bytes() {
        let reply = Reply(42);
        assert_eq!(Reply::from_bytes(&reply.to_bytes()), Some(reply));
        let fail = Reply::FAIL;
        assert!(!fail.is_success());
        assert!(Reply(0).is_success());
    }
}
