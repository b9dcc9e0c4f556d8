//! Accepts connections one at a time and prints the request each one sends.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;

use wirehttp::config::{load_config, ServerConfig};
use wirehttp::http::{read_request, Request};
use wirehttp::observability::logging;

#[derive(Parser)]
#[command(name = "tcplistener")]
#[command(about = "Print HTTP requests parsed off raw TCP connections", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen on 127.0.0.1:<PORT> instead of the configured address.
    #[arg(short, long)]
    port: Option<u16>,

    /// Print each request as a JSON document.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RequestView<'a> {
    method: &'a str,
    target: &'a str,
    version: &'a str,
    headers: BTreeMap<&'a str, &'a str>,
    body: String,
}

impl<'a> RequestView<'a> {
    fn new(request: &'a Request) -> Self {
        let line = request.line();
        Self {
            method: line.map_or("", |l| l.method.as_str()),
            target: request.target(),
            version: line.map_or("", |l| l.version.as_str()),
            headers: request.headers().iter().collect(),
            body: String::from_utf8_lossy(request.body()).into_owned(),
        }
    }
}

fn print_text(view: &RequestView<'_>) {
    println!("Request line:");
    println!("- Method: {}", view.method);
    println!("- Target: {}", view.target);
    println!("- Version: {}", view.version);
    println!("Headers:");
    for (name, value) in &view.headers {
        println!("- {name}: {value}");
    }
    println!("Body:");
    println!("{}", view.body);
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    loop {
        let (mut stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!(error = %e, "Accept failed");
                continue;
            }
        };
        tracing::info!(peer_addr = %peer_addr, "Connection accepted");

        match read_request(&mut stream, &config.parser).await {
            Ok(request) => {
                let view = RequestView::new(&request);
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                } else {
                    print_text(&view);
                }
            }
            Err(e) => tracing::warn!(peer_addr = %peer_addr, error = %e, "Failed to parse request"),
        }

        tracing::info!(peer_addr = %peer_addr, "Connection closed");
    }
}
