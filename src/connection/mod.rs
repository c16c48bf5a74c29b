//! Connections Module
//!
//! One task per accepted socket. Bytes from the peer are buffered until a
//! `\n` arrives; each complete line (a trailing `\r` is tolerated) becomes
//! exactly one request, and its single-line answer is flushed before the
//! next line is looked at, so pipelined requests are answered in order.
//!
//! A connection ends when:
//!
//! - the client sent `QUIT` and its `200 OK bye` has been flushed
//!   (anything pipelined after it is ignored),
//! - the peer closes its side (a partial last line is dropped),
//! - a line grows past 64 KiB without a terminator, or
//! - reading or writing the socket fails.
//!
//! Protocol errors (`400`, `426`) never close the connection.
//!
//! [`ConnectionStats`] counts accepted and open connections, lines served
//! and bytes moved; the binary uses the open-connection count to wait for
//! clients to finish during shutdown.
//!
//! ## Example
//!
//! ```ignore
//! use kvss::connection::{handle_connection, ConnectionStats};
//! use kvss::commands::CommandHandler;
//! use kvss::storage::Store;
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::new());
//! let stats = Arc::new(ConnectionStats::new());
//! let handler = CommandHandler::new(store);
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler, stats));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
