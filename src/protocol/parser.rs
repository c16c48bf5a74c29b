//! KV/1.0 Request Parser
//!
//! Turns one request line into a [`Command`] or a [`ParseError`].
//!
//! ## Line Format
//!
//! ```text
//! KV/1.0 <VERB> [<arg> ...]
//! ```
//!
//! Tokens are separated by runs of ASCII whitespace. The caller strips the
//! line terminator before calling [`parse_request`]; any leftover trailing
//! whitespace (such as a `\r`) is ignored by the tokenizer.
//!
//! ## Rejection Order
//!
//! 1. Not valid UTF-8, or fewer than two tokens: malformed
//! 2. First token does not start with `KV/`: missing version
//! 3. First token is not exactly `KV/1.0`: unsupported version
//!
//! The version check happens before anything looks at the verb or its
//! arguments, so `KV/2.0 GET k` is always an upgrade error. Argument counts are
//! validated later by the command handler.

use crate::protocol::types::StatusCode;
use std::fmt;
use thiserror::Error;

/// Prefix every version tag starts with
pub const PROTOCOL_TAG: &str = "KV/";

/// The only version this server speaks
pub const PROTOCOL_VERSION: &str = "KV/1.0";

/// Reasons a request line can be rejected before dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// The line has fewer than the two mandatory tokens
    #[error("expected at least 2 tokens, got {0}")]
    TooFewTokens(usize),

    /// The first token is not a `KV/` version tag
    #[error("missing version tag, got '{0}'")]
    MissingVersion(String),

    /// The version tag names a version we do not support
    #[error("unsupported protocol version '{0}'")]
    UnsupportedVersion(String),
}

impl ParseError {
    /// The status code the client receives for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedVersion(_) => StatusCode::UpgradeRequired,
            ParseError::InvalidUtf8(_)
            | ParseError::TooFewTokens(_)
            | ParseError::MissingVersion(_) => StatusCode::BadRequest,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// The command keyword of a request. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Put,
    Get,
    Del,
    Stats,
    Quit,
    /// Any other token in verb position
    Unknown(String),
}

impl Verb {
    fn from_token(token: &str) -> Self {
        match token {
            "PUT" => Verb::Put,
            "GET" => Verb::Get,
            "DEL" => Verb::Del,
            "STATS" => Verb::Stats,
            "QUIT" => Verb::Quit,
            other => Verb::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Put => "PUT",
            Verb::Get => "GET",
            Verb::Del => "DEL",
            Verb::Stats => "STATS",
            Verb::Quit => "QUIT",
            Verb::Unknown(s) => s,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    version: String,
    verb: Verb,
    args: Vec<String>,
}

impl Command {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Arguments following the verb, in request order.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Parses one request line (without its terminator).
///
/// # Example
///
/// ```
/// use kvss::protocol::{parse_request, Verb};
///
/// let command = parse_request(b"KV/1.0 PUT user42 Alice Smith").unwrap();
/// assert_eq!(command.verb(), &Verb::Put);
/// assert_eq!(command.args(), ["user42", "Alice", "Smith"]);
/// ```
pub fn parse_request(line: &[u8]) -> ParseResult<Command> {
    let line = std::str::from_utf8(line).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    let mut tokens = line.split_ascii_whitespace();
    let (version, verb) = match (tokens.next(), tokens.next()) {
        (Some(version), Some(verb)) => (version, verb),
        (Some(_), None) => return Err(ParseError::TooFewTokens(1)),
        _ => return Err(ParseError::TooFewTokens(0)),
    };

    if !version.starts_with(PROTOCOL_TAG) {
        return Err(ParseError::MissingVersion(version.to_string()));
    }
    if version != PROTOCOL_VERSION {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }

    Ok(Command {
        version: version.to_string(),
        verb: Verb::from_token(verb),
        args: tokens.map(str::to_string).collect(),
    })
}
