//! Taskboard — collaborative task-tracking RPC server
//!
//! A single-process backend that exposes the task board domain
//! (users, projects, categories, tasks) over JSON-RPC 2.0 via
//! WebSocket. Clients hold one persistent connection; authentication
//! is per connection via user.register / user.login / user.authorize.
//!
//! Usage:
//!   taskboard                              # Default port 8081
//!   taskboard --port 9000                  # Custom port
//!   taskboard --db-path /var/lib/board.db  # Custom database location

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use taskboard_server::RpcServer;
use taskboard_store::TaskStore;
use taskboard_transport::{TransportConfig, TransportServer};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Taskboard — collaborative task-tracking RPC server")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, default_value = "8081")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, default_value = "127.0.0.1")]
    hostname: String,

    /// SQLite database path
    #[arg(long, default_value = "taskboard.db")]
    db_path: PathBuf,

    /// Maximum concurrent connections
    #[arg(long, default_value = "1024")]
    max_connections: usize,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Taskboard Server                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Database:   {}", cli.db_path.display());
    println!("  Port:       {}", cli.port);
    println!("  Binding:    {}", cli.hostname);
    println!();

    let store = match TaskStore::open(&cli.db_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open database {}: {e}", cli.db_path.display());
            std::process::exit(1);
        }
    };

    let server = Arc::new(RpcServer::new(store));

    let transport_config = TransportConfig {
        port: cli.port,
        hostname: cli.hostname.clone(),
        max_connections: Some(cli.max_connections),
    };

    let mut transport = match TransportServer::start(transport_config, server).await {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to start transport: {e}");
            std::process::exit(1);
        }
    };

    println!("  Server running!");
    println!();
    println!("  WebSocket endpoint:");
    println!("    ws://{}:{}/ws", cli.hostname, transport.port());
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    let _ = tokio::signal::ctrl_c().await;

    println!();
    println!("  Shutting down...");
    transport.stop().await;
    println!("  Server stopped.");
}
