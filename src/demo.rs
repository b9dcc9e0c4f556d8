//! Demo handlers served by the `wirehttp` binary.
//!
//! | target           | response                                         |
//! |------------------|--------------------------------------------------|
//! | `/yourproblem`   | 400 HTML                                         |
//! | `/myproblem`     | 500 HTML                                         |
//! | `/httpbin/<p>`   | upstream `<p>` streamed back chunked, hashed     |
//! | `/video`         | `<assets_dir>/vim.mp4`                           |
//! | anything else    | 200 HTML                                         |

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::config::DemoConfig;
use crate::http::{ConnectionWriter, Handler, Headers, Request, StatusCode, WriteError};

const BAD_REQUEST_HTML: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

const INTERNAL_ERROR_HTML: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

const OK_HTML: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

const UPSTREAM_PREFIX: &str = "/httpbin/";

/// Routes requests to the demo responses.
#[derive(Debug, Clone)]
pub struct DemoHandler {
    config: DemoConfig,
    client: reqwest::Client,
}

impl DemoHandler {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn video_path(&self) -> PathBuf {
        PathBuf::from(&self.config.assets_dir).join("vim.mp4")
    }

    fn upstream_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.upstream_base_url.trim_end_matches('/'), path)
    }

    async fn route(&self, res: &mut ConnectionWriter, req: &Request) -> Result<(), WriteError> {
        let target = req.target();
        match target {
            "/yourproblem" => write_html(res, StatusCode::BadRequest, BAD_REQUEST_HTML).await,
            "/myproblem" => write_html(res, StatusCode::InternalServerError, INTERNAL_ERROR_HTML).await,
            "/video" => self.video(res).await,
            _ => match target.strip_prefix(UPSTREAM_PREFIX) {
                Some(path) => self.proxy(res, path).await,
                None => write_html(res, StatusCode::Ok, OK_HTML).await,
            },
        }
    }

    async fn video(&self, res: &mut ConnectionWriter) -> Result<(), WriteError> {
        let path = self.video_path();
        let video = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read asset");
                return write_html(res, StatusCode::InternalServerError, INTERNAL_ERROR_HTML).await;
            }
        };

        let mut headers = Headers::new();
        headers.set("Content-Type", "video/mp4");
        headers.set("Content-Length", video.len().to_string());
        headers.set("Connection", "close");
        res.write_status_line(StatusCode::Ok).await?;
        res.write_headers(&headers).await?;
        res.write_body(&video).await?;
        Ok(())
    }

    /// Stream an upstream response back chunked, followed by trailers with
    /// the SHA-256 and length of everything sent.
    async fn proxy(&self, res: &mut ConnectionWriter, path: &str) -> Result<(), WriteError> {
        let url = self.upstream_url(path);
        let mut upstream = match self.client.get(&url).send().await {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Upstream request failed");
                return write_html(res, StatusCode::InternalServerError, INTERNAL_ERROR_HTML).await;
            }
        };

        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut headers = Headers::new();
        headers.set("Content-Type", content_type);
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Trailer", "X-Content-SHA256, X-Content-Length");
        res.write_status_line(StatusCode::Ok).await?;
        res.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut total = 0usize;
        loop {
            match upstream.chunk().await {
                Ok(Some(chunk)) => {
                    hasher.update(&chunk);
                    total += res.write_chunk(&chunk).await?;
                }
                Ok(None) => break,
                Err(e) => {
                    // Headers are out; end the body early and let the
                    // trailers describe what was actually sent.
                    tracing::warn!(url = %url, error = %e, "Upstream body interrupted");
                    break;
                }
            }
        }
        res.write_chunk_end().await?;

        let mut trailers = Headers::new();
        trailers.set("X-Content-SHA256", format!("{:x}", hasher.finalize()));
        trailers.set("X-Content-Length", total.to_string());
        res.write_trailers(&trailers).await?;

        tracing::debug!(url = %url, bytes = total, "Upstream response relayed");
        Ok(())
    }
}

impl Handler for DemoHandler {
    async fn handle(&self, res: &mut ConnectionWriter, req: Request) {
        if let Err(e) = self.route(res, &req).await {
            tracing::warn!(request_target = %req.target(), error = %e, "Failed to write response");
        }
    }
}

async fn write_html(
    res: &mut ConnectionWriter,
    status: StatusCode,
    html: &str,
) -> Result<(), WriteError> {
    let mut headers = Headers::new();
    headers.set("Content-Type", "text/html");
    headers.set("Content-Length", html.len().to_string());
    headers.set("Connection", "close");
    res.write_status_line(status).await?;
    res.write_headers(&headers).await?;
    res.write_body(html.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_url_joins_cleanly() {
        let handler = DemoHandler::new(DemoConfig {
            assets_dir: "assets".to_string(),
            upstream_base_url: "http://127.0.0.1:9/".to_string(),
        });
        assert_eq!(handler.upstream_url("stream/10"), "http://127.0.0.1:9/stream/10");
        assert_eq!(handler.video_path(), PathBuf::from("assets").join("vim.mp4"));
    }
}
