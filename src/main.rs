//! KVSS - Key-Value Store Service
//!
//! This is the main entry point for the KVSS server.
//! It parses the listen address, sets up logging, and runs the accept loop
//! until Ctrl+C, then waits for open connections to finish.

use anyhow::Context;
use clap::Parser;
use kvss::{Config, Server, DEFAULT_BACKLOG, DEFAULT_HOST, DEFAULT_PORT};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// KVSS server
#[derive(Parser, Debug)]
#[command(name = "kvss")]
#[command(about = "In-memory key-value store speaking the KV/1.0 line protocol")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of pending connections
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    backlog: u32,
}

fn print_banner(addr: SocketAddr) {
    println!(
        r#"
KVSS v{} - Key-Value Store Service
──────────────────────────────────────────────────────────────
Server started on {}
Protocol: KV/1.0 (one request line in, one status line out)

Try it:
    $ nc {} {}
    KV/1.0 PUT user42 Alice
    201 CREATED

Use Ctrl+C to shutdown gracefully.
"#,
        kvss::VERSION,
        addr,
        addr.ip(),
        addr.port()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::builder()
        .host(args.host)
        .port(args.port)
        .backlog(args.backlog)
        .build();

    let server = Server::bind(&config)
        .await
        .with_context(|| format!("failed to listen on {}", config.bind_address()))?;

    print_banner(server.local_addr());

    let stats = server.stats();
    let shutdown = server.shutdown_handle();

    // Set up graceful shutdown
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping server...");
                shutdown.shutdown();
            }
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    server.run().await;

    // Let connected clients finish; a second Ctrl+C stops waiting
    let active = stats.active_connections.load(Ordering::Relaxed);
    if active > 0 {
        info!(active, "Waiting for open connections to close (Ctrl+C again to force)");
        tokio::select! {
            _ = stats.wait_until_idle(Duration::from_millis(100)) => {
                info!("All connections closed");
            }
            _ = signal::ctrl_c() => {
                warn!(
                    active = stats.active_connections.load(Ordering::Relaxed),
                    "Forced shutdown, dropping open connections"
                );
            }
        }
    }

    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        active = stats.active_connections.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        bytes_read = stats.bytes_read.load(Ordering::Relaxed),
        bytes_written = stats.bytes_written.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}
