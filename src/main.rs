//! Demo HTTP server built on the raw framing core.
//!
//! ```text
//! load config → init logging → Server::start(DemoHandler)
//!     → wait for SIGINT/SIGTERM
//!     → close → wait for accept loop → drain in-flight connections
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use wirehttp::config::{load_config, ServerConfig};
use wirehttp::demo::DemoHandler;
use wirehttp::lifecycle::shutdown_signal;
use wirehttp::observability::logging;
use wirehttp::Server;

#[derive(Parser)]
#[command(name = "wirehttp")]
#[command(about = "HTTP/1.1 demo server speaking raw TCP", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen on 127.0.0.1:<PORT> instead of the configured address.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.bind_address = format!("127.0.0.1:{port}");
    }

    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        initial_buffer_size = config.parser.initial_buffer_size,
        "Configuration loaded"
    );

    let handler = DemoHandler::new(config.demo.clone());
    let server = Server::start(&config, handler).await?;
    tracing::info!(address = %server.local_addr(), "Server listening");

    shutdown_signal().await;

    server.close()?;
    server.wait().await;

    let grace = Duration::from_secs(config.listener.shutdown_grace_secs);
    if tokio::time::timeout(grace, server.drain()).await.is_err() {
        tracing::warn!(
            remaining = server.active_connections(),
            "Grace period elapsed with connections still open"
        );
    }

    tracing::info!("Server gracefully stopped");
    Ok(())
}
