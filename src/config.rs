//! Configuration for KVSS
//!
//! Centralized listener configuration with sensible defaults.

use crate::{DEFAULT_BACKLOG, DEFAULT_HOST, DEFAULT_PORT};

/// Listener configuration for a KVSS server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host (name or IP address) to bind to
    pub host: String,

    /// TCP port to listen on. `0` lets the OS pick one.
    pub port: u16,

    /// Maximum number of pending connections in the accept queue
    pub backlog: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the host to bind to
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the listen backlog
    pub fn backlog(mut self, backlog: u32) -> Self {
        self.config.backlog = backlog;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
