//! Connection server.
//!
//! # Responsibilities
//! - Bind the listener and run the accept loop as its own task
//! - Spawn one task per connection: parse the request, then call the handler
//! - Answer malformed requests with a fixed 400
//! - Stop accepting on `close()`; in-flight connections run to completion

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{ParserConfig, ServerConfig};
use crate::http::reader::read_request;
use crate::http::request::Request;
use crate::http::response::{ResponseWriter, StatusCode};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionId, ConnectionTracker, Listener, ListenerError};

/// Body of the response sent when a request cannot be parsed.
pub const BAD_REQUEST_BODY: &str = "improperly formatted request";

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Response writer handed to handlers.
pub type ConnectionWriter = ResponseWriter<BufWriter<TcpStream>>;

/// Application callback run once per successfully parsed request.
///
/// Implementations write a complete response through `res`; the connection
/// is finished and closed when the returned future resolves.
pub trait Handler: Send + Sync + 'static {
    fn handle(
        &self,
        res: &mut ConnectionWriter,
        req: Request,
    ) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The accept loop is gone, so there is nothing to close.
    #[error("server is not listening")]
    NotListening,
}

/// Handle to a running server.
///
/// Dropping the handle stops the accept loop just like [`close`](Self::close).
#[derive(Debug)]
pub struct Server {
    accepting: AtomicBool,
    shutdown: Shutdown,
    local_addr: SocketAddr,
    tracker: ConnectionTracker,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

/// Serve `handler` on `127.0.0.1:port` with default settings.
pub async fn serve<H: Handler>(port: u16, handler: H) -> Result<Server, ServerError> {
    let mut config = ServerConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{port}");
    Server::start(&config, handler).await
}

impl Server {
    /// Bind and start accepting in a background task.
    pub async fn start<H: Handler>(config: &ServerConfig, handler: H) -> Result<Self, ServerError> {
        let listener = Listener::bind(&config.listener).await?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::new(handler),
            config.parser.clone(),
            tracker.clone(),
            shutdown.subscribe(),
        ));

        tracing::info!(address = %local_addr, "Server started");

        Ok(Self {
            accepting: AtomicBool::new(true),
            shutdown,
            local_addr,
            tracker,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    /// Stop accepting connections. Idempotent.
    ///
    /// Only the first call signals the accept loop, which then drops the
    /// listener. Connections already accepted are left to finish.
    pub fn close(&self) -> Result<(), ServerError> {
        if self
            .accepting
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        if self.shutdown.trigger() == 0 {
            return Err(ServerError::NotListening);
        }
        tracing::info!(address = %self.local_addr, "Server closing");
        Ok(())
    }

    /// Wait for the accept loop to exit.
    pub async fn wait(&self) {
        let task = self
            .accept_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Accept loop panicked");
            }
        }
    }

    /// Wait until every accepted connection has finished.
    pub async fn drain(&self) {
        self.tracker.wait_idle().await;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn active_connections(&self) -> usize {
        self.tracker.active_count()
    }
}

async fn accept_loop<H: Handler>(
    listener: Listener,
    handler: Arc<H>,
    parser: ParserConfig,
    tracker: ConnectionTracker,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer_addr, permit)) => {
                let guard = tracker.track();
                let handler = Arc::clone(&handler);
                let parser = parser.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, guard.id(), handler.as_ref(), &parser).await;
                    drop(permit);
                    drop(guard);
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Accept failed");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }

    tracing::info!(
        address = ?listener.local_addr().ok(),
        "Listener closed"
    );
}

async fn handle_connection<H: Handler>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    id: ConnectionId,
    handler: &H,
    parser: &ParserConfig,
) {
    let parsed = read_request(&mut stream, parser).await;
    let mut writer = ResponseWriter::new(BufWriter::new(stream));

    match parsed {
        Ok(request) => {
            tracing::debug!(
                connection_id = %id,
                peer_addr = %peer_addr,
                method = ?request.method(),
                request_target = %request.target(),
                body_len = request.body().len(),
                "Request parsed"
            );
            handler.handle(&mut writer, request).await;
        }
        Err(e) => {
            tracing::warn!(
                connection_id = %id,
                peer_addr = %peer_addr,
                error = %e,
                "Rejecting malformed request"
            );
            if let Err(e) = writer
                .respond_with_error(StatusCode::BadRequest, BAD_REQUEST_BODY)
                .await
            {
                tracing::debug!(connection_id = %id, error = %e, "Failed to send 400");
            }
        }
    }

    if let Err(e) = writer.finish().await {
        tracing::debug!(connection_id = %id, error = %e, "Failed to flush response");
    }
    let mut stream = writer.into_inner().into_inner();
    if let Err(e) = stream.shutdown().await {
        tracing::trace!(connection_id = %id, error = %e, "Shutdown after response failed");
    }
}
