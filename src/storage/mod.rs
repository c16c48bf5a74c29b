//! Storage Module
//!
//! This module provides the shared, thread-safe key-value store. It holds the
//! mapping, the served-request counter and the server start time.
//!
//! ## Example
//!
//! ```
//! use kvss::storage::{PutOutcome, Store};
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::new());
//!
//! assert_eq!(store.put("name", "Ariz").unwrap(), PutOutcome::Created);
//! assert_eq!(store.get("name"), Some("Ariz".to_string()));
//! ```

pub mod store;

pub use store::{PutOutcome, StorageError, StorageResult, Store, StoreStats};
