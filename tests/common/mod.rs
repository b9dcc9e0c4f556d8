//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use wirehttp::ServerConfig;

/// Upper bound on any single network step in a test.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default configuration bound to an ephemeral loopback port.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Send `request`, half-close, and read the response until the server closes.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();
    read_response(&mut stream).await
}

/// Read from `stream` until EOF.
pub async fn read_response(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    tokio::time::timeout(STEP_TIMEOUT, stream.read_to_end(&mut out))
        .await
        .expect("response timed out")
        .unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

/// Poll `check` until it holds or the step timeout passes.
#[allow(dead_code)]
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(STEP_TIMEOUT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}
