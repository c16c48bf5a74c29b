//! Thread-Safe Key-Value Store
//!
//! The store is the only state shared between client connections. It holds
//! the key-value mapping together with the served-request counter behind a
//! single `RwLock`, so every operation is one critical section.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Store                   │
//! │  ┌───────────────────────────────────┐  │
//! │  │             RwLock                │  │
//! │  │  HashMap<String, String>          │  │
//! │  │  requests_served: u64             │  │
//! │  └───────────────────────────────────┘  │
//! │  start_time: Instant (immutable)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! PUT checks for the key and writes it under the same write guard, so two
//! concurrent PUTs of a new key can never both report it as created.
//! Guards are never held across an `.await`.
//!
//! ## Poisoning
//!
//! Every mutation is a single `HashMap` call or counter increment, so a task
//! that panics while holding the lock cannot leave the map half-updated. A
//! poisoned lock is logged, cleared and used as-is; one crashed connection
//! never takes the store away from the others.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::error;

/// Errors raised by store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Keys must be non-empty and free of whitespace
    #[error("invalid key '{0}'")]
    InvalidKey(String),

    /// Values must fit on a single protocol line
    #[error("value contains a line terminator")]
    InvalidValue,
}

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// What a PUT did to the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The key was absent and has been inserted
    Created,
    /// The key was present and its value has been replaced
    Updated,
}

/// Point-in-time view of the store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of distinct keys currently present
    pub keys: usize,
    /// Time since the store was created
    pub uptime: Duration,
    /// Requests served so far
    pub requests_served: u64,
}

#[derive(Debug, Default)]
struct Inner {
    data: HashMap<String, String>,
    requests_served: u64,
}

/// The shared in-memory store.
///
/// Wrap it in an `Arc` and hand a clone to every connection.
///
/// # Example
///
/// ```
/// use kvss::storage::{PutOutcome, Store};
///
/// let store = Store::new();
/// assert_eq!(store.put("user42", "Alice").unwrap(), PutOutcome::Created);
/// assert_eq!(store.put("user42", "Bob").unwrap(), PutOutcome::Updated);
/// assert_eq!(store.get("user42"), Some("Bob".to_string()));
/// assert!(store.delete("user42"));
/// assert!(store.is_empty());
/// ```
#[derive(Debug)]
pub struct Store {
    inner: RwLock<Inner>,
    start_time: Instant,

    /// Makes the next read panic, to exercise fault handling
    #[cfg(test)]
    fail_next_read: std::sync::atomic::AtomicBool,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store. Uptime is measured from this call.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            start_time: Instant::now(),
            #[cfg(test)]
            fail_next_read: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn recover<G>(&self, poisoned: PoisonError<G>) -> G {
        error!("Store lock poisoned by a panicked task, recovering");
        self.inner.clear_poison();
        poisoned.into_inner()
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        #[cfg(test)]
        if self
            .fail_next_read
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            panic!("injected store fault");
        }

        self.inner.read().unwrap_or_else(|e| self.recover(e))
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| self.recover(e))
    }

    /// Inserts or overwrites a key.
    ///
    /// # Returns
    ///
    /// [`PutOutcome::Created`] if the key was absent, [`PutOutcome::Updated`]
    /// if an existing value was replaced.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> StorageResult<PutOutcome> {
        let key = key.into();
        let value = value.into();

        // Same whitespace set the request tokenizer splits on
        if key.is_empty() || key.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(StorageError::InvalidKey(key));
        }
        if value.contains(['\n', '\r']) {
            return Err(StorageError::InvalidValue);
        }

        match self.write().data.insert(key, value) {
            None => Ok(PutOutcome::Created),
            Some(_) => Ok(PutOutcome::Updated),
        }
    }

    /// Returns a copy of the value for `key`, or `None` if it is absent.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read().data.get(key).cloned()
    }

    /// Removes a key.
    ///
    /// # Returns
    ///
    /// `true` if the key was present and has been removed.
    pub fn delete(&self, key: &str) -> bool {
        self.write().data.remove(key).is_some()
    }

    /// Number of distinct keys currently stored.
    pub fn len(&self) -> usize {
        self.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().data.is_empty()
    }

    /// Counts one served request and returns the new total.
    pub fn record_request(&self) -> u64 {
        let mut inner = self.write();
        inner.requests_served += 1;
        inner.requests_served
    }

    /// Time elapsed since the store was created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Reads the key count and request counter in one critical section.
    pub fn stats(&self) -> StoreStats {
        let inner = self.read();
        StoreStats {
            keys: inner.data.len(),
            uptime: self.uptime(),
            requests_served: inner.requests_served,
        }
    }

    /// Poisons the store lock the way a panicking connection task would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = self.inner.write();
                panic!("poisoning store lock");
            })
            .join()
        });
    }

    /// Makes the next read of the store panic.
    #[cfg(test)]
    pub(crate) fn fail_next_read(&self) {
        self.fail_next_read
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
