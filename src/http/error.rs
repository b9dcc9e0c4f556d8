//! Error types for request parsing and response framing.

use thiserror::Error;

/// Errors raised while reading a request off the wire.
///
/// Every variant is fatal to the connection that produced it.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Request line is not exactly `METHOD SP TARGET SP VERSION`.
    #[error("request line has incorrect format")]
    MalformedRequestLine,

    /// Method outside the supported set.
    #[error("invalid method in request line: {0}")]
    InvalidMethod(String),

    /// Anything other than `HTTP/1.1`.
    #[error("unsupported http version in request line: {0}")]
    UnsupportedVersion(String),

    /// Field line shape is wrong (no colon, stray whitespace, multi-token value).
    #[error("invalid field line syntax: {0}")]
    InvalidHeaderSyntax(&'static str),

    /// Field name does not start with a letter or holds non-token characters.
    #[error("invalid field name: {0:?}")]
    InvalidHeaderName(String),

    /// `Content-Length` is not a non-negative integer.
    #[error("improper Content-Length format: {0:?}")]
    InvalidContentLength(String),

    /// More body bytes arrived than `Content-Length` declared.
    #[error("body length {actual} exceeds declared Content-Length {expected}")]
    BodyLengthMismatch { expected: usize, actual: usize },

    /// Stream closed before the request was complete.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// A line, or the header section as a whole, outgrew the buffer cap.
    #[error("read buffer limit of {0} bytes exceeded")]
    BufferLimitExceeded(usize),

    /// Non-EOF read failure on the transport.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

/// Errors raised while writing a response.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Status code outside the supported set.
    #[error("unknown status code: {0}")]
    UnknownStatusCode(u16),

    /// Write failure on the transport.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
