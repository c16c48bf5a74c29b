//! KV/1.0 Response Types
//!
//! Every request is answered with exactly one line:
//!
//! ```text
//! <code> <STATUS_TEXT>[ <payload>]\n
//! ```
//!
//! ## Examples
//!
//! Created: `201 CREATED\n`
//! Hit: `200 OK Alice\n`
//! Miss: `404 NOT_FOUND\n`
//! Stats: `200 OK keys=3 uptime=12s served=40\n`

use bytes::Bytes;
use std::fmt;

/// The line terminator used by the KV/1.0 protocol
pub const LF: u8 = b'\n';

/// Status codes a KV/1.0 server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Request succeeded (read, overwrite, stats, quit)
    Ok,
    /// PUT stored a key that did not exist before
    Created,
    /// DEL removed an existing key
    NoContent,
    /// Malformed line, missing version tag, unknown verb or wrong arity
    BadRequest,
    /// GET/DEL on an absent key
    NotFound,
    /// Version tag present but not the supported one
    UpgradeRequired,
    /// Unexpected fault while executing a command
    ServerError,
}

impl StatusCode {
    /// Numeric code sent on the wire.
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::UpgradeRequired => 426,
            StatusCode::ServerError => 500,
        }
    }

    /// Status text sent after the numeric code.
    pub fn text(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "CREATED",
            StatusCode::NoContent => "NO_CONTENT",
            StatusCode::BadRequest => "BAD_REQUEST",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::UpgradeRequired => "UPGRADE_REQUIRED",
            StatusCode::ServerError => "SERVER_ERROR",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.text())
    }
}

/// A single response line.
///
/// Responses are built by the command handler and consumed by the
/// connection handler, which writes them out with [`Response::serialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    payload: Option<String>,
    /// Set on the QUIT acknowledgment
    close: bool,
}

impl Response {
    /// Creates a response with no payload.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
            close: false,
        }
    }

    /// Creates a response carrying a payload after the status text.
    pub fn with_payload(status: StatusCode, payload: impl Into<String>) -> Self {
        Self {
            status,
            payload: Some(payload.into()),
            close: false,
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::Ok)
    }

    pub fn created() -> Self {
        Self::new(StatusCode::Created)
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NoContent)
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound)
    }

    pub fn upgrade_required() -> Self {
        Self::new(StatusCode::UpgradeRequired)
    }

    pub fn server_error() -> Self {
        Self::new(StatusCode::ServerError)
    }

    /// The QUIT acknowledgment. The connection is closed once it is flushed.
    pub fn bye() -> Self {
        Self {
            status: StatusCode::Ok,
            payload: Some("bye".to_string()),
            close: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Returns true if the session must end after this response.
    pub fn closes_connection(&self) -> bool {
        self.close
    }

    /// Serializes the response to its wire form, including the trailing newline.
    pub fn serialize(&self) -> Bytes {
        let mut line = self.to_string();
        line.push(LF as char);
        Bytes::from(line)
    }
}

impl From<StatusCode> for Response {
    fn from(status: StatusCode) -> Self {
        Response::new(status)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{} {}", self.status, payload),
            None => write!(f, "{}", self.status),
        }
    }
}
