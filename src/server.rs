//! TCP Server
//!
//! Binds the listening socket, accepts clients and spawns one
//! connection task per client.
//!
//! ## Shutdown
//!
//! The server keeps a running flag in a `watch` channel. Flipping it through
//! a [`ShutdownHandle`] makes the accept loop return and drop the listener,
//! which closes the listening socket. Connections that are already being
//! served keep their tasks and finish on their own.

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{lookup_host, TcpListener, TcpSocket};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Errors that can occur while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket setup failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured host did not resolve to any address
    #[error("could not resolve listen address '{0}'")]
    Resolve(String),
}

/// A bound KVSS server, ready to accept connections.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    store: Arc<Store>,
    stats: Arc<ConnectionStats>,
    running: Arc<watch::Sender<bool>>,
}

/// Stops a running [`Server`] from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Clears the running flag. The accept loop exits and closes the
    /// listening socket; in-flight connections are left to finish.
    pub fn shutdown(&self) {
        if self.running.send_replace(false) {
            info!("Shutdown requested");
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

impl Server {
    /// Binds a server to the configured address with a fresh, empty store.
    pub async fn bind(config: &Config) -> Result<Self, ServerError> {
        Self::bind_with_store(config, Arc::new(Store::new())).await
    }

    /// Binds a server that serves the given store.
    pub async fn bind_with_store(config: &Config, store: Arc<Store>) -> Result<Self, ServerError> {
        let bind_address = config.bind_address();
        let addr = lookup_host(&bind_address)
            .await?
            .next()
            .ok_or_else(|| ServerError::Resolve(bind_address.clone()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;

        let listener = socket.listen(config.backlog)?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, backlog = config.backlog, "Listening");

        let (running, _) = watch::channel(true);

        Ok(Self {
            listener,
            local_addr,
            store,
            stats: Arc::new(ConnectionStats::new()),
            running: Arc::new(running),
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Runs the accept loop until shutdown is requested.
    pub async fn run(self) {
        let mut running = self.running.subscribe();

        while *running.borrow_and_update() {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let handler = CommandHandler::new(Arc::clone(&self.store));
                        let stats = Arc::clone(&self.stats);

                        tokio::spawn(async move {
                            handle_connection(stream, addr, handler, stats).await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
                changed = running.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(addr = %self.local_addr, "Accept loop stopped");
        drop(self.listener);
        info!(addr = %self.local_addr, "Listener closed");
    }
}
