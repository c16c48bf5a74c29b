//! Command Handler Module
//!
//! This module implements the KV/1.0 verbs. It receives raw request lines,
//! runs them through the parser, executes them against the store and
//! returns the response to send back.
//!
//! ## Supported Commands
//!
//! - `PUT key value...` - Store a key (value may contain spaces)
//! - `GET key` - Read a key
//! - `DEL key` - Delete a key
//! - `STATS` - Key count, uptime and served requests
//! - `QUIT` - End the session
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   parse()   │───>│  dispatch() │───>│  cmd_*()    │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                             Store           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys or values the store refuses are answered `400 BAD_REQUEST`. A panic
//! while executing a command is caught in `dispatch`, logged and answered
//! `500 SERVER_ERROR`; the connection and the store stay usable.

use crate::protocol::{parse_request, Command, Response, StatusCode, Verb};
use crate::storage::{PutOutcome, StorageError, StorageResult, Store};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Executes KV/1.0 requests against the shared store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// The shared store
    storage: Arc<Store>,
}

impl CommandHandler {
    /// Creates a new command handler with the given store.
    pub fn new(storage: Arc<Store>) -> Self {
        Self { storage }
    }

    /// Handles one request line (without its terminator) and returns the response.
    ///
    /// Every line counts as one served request, whatever its outcome.
    pub fn execute(&self, line: &[u8]) -> Response {
        let served = self.storage.record_request();

        match parse_request(line) {
            Ok(command) => self.dispatch(&command),
            Err(e) => {
                debug!(request = served, error = %e, "Rejected request");
                e.status().into()
            }
        }
    }

    /// Executes an already parsed command.
    ///
    /// A panic raised while executing is answered with `500 SERVER_ERROR`.
    pub fn dispatch(&self, command: &Command) -> Response {
        let args = command.args();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match command.verb() {
            Verb::Put => self.cmd_put(args),
            Verb::Get => Ok(self.cmd_get(args)),
            Verb::Del => Ok(self.cmd_del(args)),
            Verb::Stats => Ok(self.cmd_stats()),
            Verb::Quit => Ok(Response::bye()),
            Verb::Unknown(verb) => {
                debug!(verb = %verb, "Unknown command");
                Ok(Response::bad_request())
            }
        }));

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => Self::rejected(e),
            Err(cause) => {
                let reason = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(verb = ?command.verb(), reason = %reason, "Command panicked");
                Response::server_error()
            }
        }
    }

    fn rejected(e: StorageError) -> Response {
        debug!(error = %e, "Rejected by store");
        Response::bad_request()
    }

    /// PUT key value...
    fn cmd_put(&self, args: &[String]) -> StorageResult<Response> {
        if args.len() < 2 {
            return Ok(Response::bad_request());
        }

        let key = &args[0];
        let value = args[1..].join(" ");

        Ok(match self.storage.put(key.as_str(), value)? {
            PutOutcome::Created => Response::created(),
            PutOutcome::Updated => Response::ok(),
        })
    }

    /// GET key
    fn cmd_get(&self, args: &[String]) -> Response {
        if args.len() != 1 {
            return Response::bad_request();
        }

        match self.storage.get(&args[0]) {
            Some(value) => Response::with_payload(StatusCode::Ok, value),
            None => Response::not_found(),
        }
    }

    /// DEL key
    fn cmd_del(&self, args: &[String]) -> Response {
        if args.len() != 1 {
            return Response::bad_request();
        }

        if self.storage.delete(&args[0]) {
            Response::no_content()
        } else {
            Response::not_found()
        }
    }

    /// STATS
    fn cmd_stats(&self) -> Response {
        let stats = self.storage.stats();

        Response::with_payload(
            StatusCode::Ok,
            format!(
                "keys={} uptime={}s served={}",
                stats.keys,
                stats.uptime.as_secs(),
                stats.requests_served
            ),
        )
    }
}
