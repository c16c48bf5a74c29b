//! # KVSS - Key-Value Store Service
//!
//! KVSS is a small in-memory key-value server. Clients talk to it over TCP
//! with KV/1.0, a line-oriented text protocol: every request is one line,
//! every response is one status line.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                              KVSS                               │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │          │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │          │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘          │
//! │                                               │                 │
//! │                                               ▼                 │
//! │  ┌─────────────┐    ┌───────────────────────────────────────┐   │
//! │  │   KV/1.0    │    │                Store                  │   │
//! │  │   Parser    │    │   RwLock<{ HashMap, requests_served }>│   │
//! │  └─────────────┘    └───────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use kvss::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::bind(&Config::default()).await?;
//!     let shutdown = server.shutdown_handle();
//!
//!     tokio::spawn(async move {
//!         tokio::signal::ctrl_c().await.ok();
//!         shutdown.shutdown();
//!     });
//!
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! | Request                    | Responses                                  |
//! |----------------------------|--------------------------------------------|
//! | `KV/1.0 PUT key value...`  | `201 CREATED`, `200 OK`, `400 BAD_REQUEST` |
//! | `KV/1.0 GET key`           | `200 OK <value>`, `404 NOT_FOUND`          |
//! | `KV/1.0 DEL key`           | `204 NO_CONTENT`, `404 NOT_FOUND`          |
//! | `KV/1.0 STATS`             | `200 OK keys=<n> uptime=<s>s served=<n>`   |
//! | `KV/1.0 QUIT`              | `200 OK bye`, then the server hangs up     |
//!
//! A line without a `KV/` tag is a `400 BAD_REQUEST`; a `KV/` tag other than
//! `KV/1.0` is a `426 UPGRADE_REQUIRED`. Internal faults answer
//! `500 SERVER_ERROR` and leave the connection open.
//!
//! ## Module Overview
//!
//! - [`protocol`]: KV/1.0 request parser and response types
//! - [`storage`]: Thread-safe store with request counters
//! - [`commands`]: Verb dispatch and status code selection
//! - [`connection`]: Per-client read/execute/respond loop
//! - [`server`]: Listener, accept loop and shutdown
//! - [`config`]: Listener configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_request, Command, ParseError, Response, StatusCode, Verb};
pub use server::{Server, ServerError, ShutdownHandle};
pub use storage::{PutOutcome, StorageError, Store};

/// The default port KVSS listens on
pub const DEFAULT_PORT: u16 = 5050;

/// The default host KVSS binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The default listen backlog
pub const DEFAULT_BACKLOG: u32 = 128;

/// Version of KVSS
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
