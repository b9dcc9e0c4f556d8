//! Response framing.
//!
//! [`ResponseWriter`] is a sequential protocol writer. Callers must follow
//!
//! ```text
//! status line → headers → body*
//!                       → chunk* → chunk end → [trailers]
//! ```
//!
//! Calling out of order is a caller bug; debug builds assert on it, release
//! builds write whatever they are asked to.

use std::fmt;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::error::WriteError;
use crate::http::headers::{Headers, CRLF};

/// Status codes this framer knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    InternalServerError,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = WriteError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(StatusCode::Ok),
            400 => Ok(StatusCode::BadRequest),
            500 => Ok(StatusCode::InternalServerError),
            other => Err(WriteError::UnknownStatusCode(other)),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

/// Where the writer is in the response sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    StatusLine,
    Headers,
    Body,
    Chunked,
    ChunksEnded,
    Done,
}

/// Headers sent with plaintext responses of known length.
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", content_len.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

/// Writes one HTTP/1.1 response onto `W`.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    inner: W,
    phase: Phase,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            phase: Phase::StatusLine,
        }
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        debug_assert_eq!(self.phase, Phase::StatusLine, "status line written twice");
        let line = format!("HTTP/1.1 {} {}\r\n", status.as_u16(), status.reason());
        self.inner.write_all(line.as_bytes()).await?;
        self.phase = Phase::Headers;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriteError> {
        debug_assert_eq!(self.phase, Phase::Headers, "headers written out of order");
        self.write_fields(headers).await?;
        self.phase = Phase::Body;
        Ok(())
    }

    /// Raw body bytes; the caller is responsible for matching any declared
    /// `Content-Length`.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        debug_assert_eq!(self.phase, Phase::Body, "body written before headers");
        self.inner.write_all(body).await?;
        Ok(body.len())
    }

    /// One chunk of a `Transfer-Encoding: chunked` body. Empty input writes
    /// nothing, since a zero-size chunk ends the body.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        debug_assert!(
            matches!(self.phase, Phase::Body | Phase::Chunked),
            "chunk written out of order"
        );
        self.phase = Phase::Chunked;
        if data.is_empty() {
            return Ok(0);
        }
        let size = format!("{:x}\r\n", data.len());
        self.inner.write_all(size.as_bytes()).await?;
        self.inner.write_all(data).await?;
        self.inner.write_all(CRLF).await?;
        Ok(data.len())
    }

    /// The terminal zero-size chunk. Trailers, if any, follow.
    pub async fn write_chunk_end(&mut self) -> Result<(), WriteError> {
        debug_assert!(
            matches!(self.phase, Phase::Body | Phase::Chunked),
            "chunk end written out of order"
        );
        self.inner.write_all(b"0\r\n").await?;
        self.phase = Phase::ChunksEnded;
        Ok(())
    }

    /// Trailer fields and the blank line closing the chunked message.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriteError> {
        debug_assert_eq!(self.phase, Phase::ChunksEnded, "trailers before chunk end");
        self.write_fields(trailers).await?;
        self.phase = Phase::Done;
        Ok(())
    }

    /// Close out the message and flush.
    ///
    /// A chunked body whose trailers were never written gets an empty trailer
    /// section so the message is well formed.
    pub async fn finish(&mut self) -> Result<(), WriteError> {
        if self.phase == Phase::ChunksEnded {
            self.write_trailers(&Headers::new()).await?;
        }
        self.inner.flush().await?;
        Ok(())
    }

    /// Status line, default plaintext headers, and `message` as the body.
    pub async fn respond_with_error(
        &mut self,
        status: StatusCode,
        message: &str,
    ) -> Result<(), WriteError> {
        self.write_status_line(status).await?;
        self.write_headers(&default_headers(message.len())).await?;
        self.write_body(message.as_bytes()).await?;
        Ok(())
    }

    /// Whether anything has been written yet.
    pub fn is_started(&self) -> bool {
        self.phase != Phase::StatusLine
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    async fn write_fields(&mut self, fields: &Headers) -> Result<(), WriteError> {
        let mut out = Vec::new();
        for (name, value) in fields.iter() {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF);
        }
        out.extend_from_slice(CRLF);
        self.inner.write_all(&out).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> ResponseWriter<Vec<u8>> {
        ResponseWriter::new(Vec::new())
    }

    fn written(w: ResponseWriter<Vec<u8>>) -> String {
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn status_codes_convert() {
        assert_eq!(StatusCode::try_from(200).unwrap(), StatusCode::Ok);
        assert_eq!(StatusCode::try_from(400).unwrap(), StatusCode::BadRequest);
        assert_eq!(StatusCode::try_from(500).unwrap(), StatusCode::InternalServerError);
        assert!(matches!(
            StatusCode::try_from(404),
            Err(WriteError::UnknownStatusCode(404))
        ));
        assert_eq!(StatusCode::InternalServerError.to_string(), "500 Internal Server Error");
    }

    #[tokio::test]
    async fn status_lines() {
        for (status, expected) in [
            (StatusCode::Ok, "HTTP/1.1 200 OK\r\n"),
            (StatusCode::BadRequest, "HTTP/1.1 400 Bad Request\r\n"),
            (StatusCode::InternalServerError, "HTTP/1.1 500 Internal Server Error\r\n"),
        ] {
            let mut w = writer();
            w.write_status_line(status).await.unwrap();
            assert_eq!(written(w), expected);
        }
    }

    #[tokio::test]
    async fn fixed_length_response() {
        let mut w = writer();
        let mut headers = Headers::new();
        headers.set("Content-Length", "2");
        w.write_status_line(StatusCode::Ok).await.unwrap();
        w.write_headers(&headers).await.unwrap();
        w.write_body(b"ok").await.unwrap();
        w.finish().await.unwrap();
        assert_eq!(written(w), "HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok");
    }

    #[tokio::test]
    async fn chunk_then_end() {
        let mut w = writer();
        w.phase = Phase::Body;
        w.write_chunk(b"abc").await.unwrap();
        w.write_chunk_end().await.unwrap();
        assert_eq!(written(w), "3\r\nabc\r\n0\r\n");
    }

    #[tokio::test]
    async fn chunk_size_is_hex_and_empty_chunk_is_skipped() {
        let mut w = writer();
        w.phase = Phase::Body;
        assert_eq!(w.write_chunk(&[b'x'; 26]).await.unwrap(), 26);
        assert_eq!(w.write_chunk(b"").await.unwrap(), 0);
        let out = written(w);
        assert!(out.starts_with("1a\r\n"));
        assert!(out.ends_with(&format!("{}\r\n", "x".repeat(26))));
    }

    #[tokio::test]
    async fn chunked_with_trailers() {
        let mut w = writer();
        let mut headers = Headers::new();
        headers.set("Transfer-Encoding", "chunked");
        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", "5");

        w.write_status_line(StatusCode::Ok).await.unwrap();
        w.write_headers(&headers).await.unwrap();
        w.write_chunk(b"hello").await.unwrap();
        w.write_chunk_end().await.unwrap();
        w.write_trailers(&trailers).await.unwrap();
        w.finish().await.unwrap();

        assert_eq!(
            written(w),
            "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\nx-content-length: 5\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn finish_closes_trailer_section() {
        let mut w = writer();
        w.phase = Phase::Body;
        w.write_chunk(b"hi").await.unwrap();
        w.write_chunk_end().await.unwrap();
        w.finish().await.unwrap();
        assert_eq!(written(w), "2\r\nhi\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn error_response_uses_default_headers() {
        let mut w = writer();
        w.respond_with_error(StatusCode::BadRequest, "improperly formatted request")
            .await
            .unwrap();
        assert_eq!(
            written(w),
            "HTTP/1.1 400 Bad Request\r\n\
             connection: close\r\n\
             content-length: 28\r\n\
             content-type: text/plain\r\n\
             \r\n\
             improperly formatted request"
        );
    }
}
