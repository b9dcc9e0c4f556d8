//! Drives the request parser over a growable buffer fed from a transport.
//!
//! # Data Flow
//! ```text
//! loop:
//!     grow buffer if full
//!     → read from transport into the spare tail
//!     → Request::parse(all buffered bytes)
//!     → compact by the consumed count
//!     → stop at target state / fatal error / premature end of stream
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ParserConfig;
use crate::http::buffer::ReadBuffer;
use crate::http::error::ParseError;
use crate::http::request::{ParseState, Request};

/// Reads one request from a transport, a bounded number of bytes at a time.
#[derive(Debug)]
pub struct RequestReader {
    buffer: ReadBuffer,
    request: Request,
    /// Bytes of request line and field lines consumed so far.
    head_len: usize,
    max_head_len: usize,
}

impl RequestReader {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            buffer: ReadBuffer::new(config.initial_buffer_size, config.max_buffer_size),
            request: Request::new(),
            head_len: 0,
            max_head_len: config.max_buffer_size,
        }
    }

    /// Read until the request reaches `target` or fails.
    ///
    /// Reaching the end of the stream first is
    /// [`ParseError::UnexpectedEndOfStream`].
    pub async fn advance_to<R>(&mut self, reader: &mut R, target: ParseState) -> Result<(), ParseError>
    where
        R: AsyncRead + Unpin,
    {
        while self.request.state() < target {
            let spare = self.buffer.spare_mut()?;
            let n = reader.read(spare).await?;

            if n == 0 {
                // The spare region is never empty, so zero bytes means EOF.
                // Whatever is still buffered gets one last chance.
                self.parse_buffered()?;
                if self.request.state() >= target {
                    break;
                }
                tracing::debug!(
                    state = ?self.request.state(),
                    buffered = self.buffer.len(),
                    "Stream ended before request was complete"
                );
                return Err(ParseError::UnexpectedEndOfStream);
            }

            self.buffer.advance(n);
            self.parse_buffered()?;
        }
        Ok(())
    }

    fn parse_buffered(&mut self) -> Result<(), ParseError> {
        let consumed = self.request.parse(self.buffer.filled())?;
        self.buffer.consume(consumed);

        // Every byte consumed while still short of the blank line is head.
        if self.request.state() <= ParseState::ParsingHeaders {
            self.head_len += consumed;
            if self.head_len > self.max_head_len {
                return Err(ParseError::BufferLimitExceeded(self.max_head_len));
            }
        }
        Ok(())
    }

    /// The request as parsed so far.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Bytes read but not consumed by the parser.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.filled()
    }

    pub fn into_request(self) -> Request {
        self.request
    }
}

/// Read a complete request from `reader`.
pub async fn read_request<R>(reader: &mut R, config: &ParserConfig) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut driver = RequestReader::new(config);
    driver.advance_to(reader, ParseState::BodyDone).await?;
    Ok(driver.into_request())
}
