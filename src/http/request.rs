//! Request model and the incremental parsing state machine.
//!
//! # State Transitions
//! ```text
//! Start ──request line──▶ ParsingHeaders ──empty line──▶ HeadersDone ──body──▶ BodyDone
//!                                       └──no Content-Length / zero──────────▶ BodyDone
//! ```
//!
//! [`Request::parse`] may be fed any prefix of the wire bytes. It reports how
//! many bytes it consumed; unconsumed bytes must be offered again together with
//! whatever arrives next.

use std::fmt;
use std::str::FromStr;

use crate::http::error::ParseError;
use crate::http::headers::{find_crlf, Headers, LineStatus, CRLF};

const SUPPORTED_VERSION: &str = "HTTP/1.1";

/// Request methods this server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(ParseError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `METHOD SP TARGET SP HTTP/1.1`, with the version stored as `"1.1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: String,
}

impl FromStr for RequestLine {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split(' ').collect();
        let [method, target, version] = parts.as_slice() else {
            return Err(ParseError::MalformedRequestLine);
        };
        if target.is_empty() {
            return Err(ParseError::MalformedRequestLine);
        }

        let method = method.parse()?;
        if *version != SUPPORTED_VERSION {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        Ok(RequestLine {
            method,
            target: target.to_string(),
            version: "1.1".to_string(),
        })
    }
}

/// Parse the request line at the front of `data`.
///
/// Returns `None` until a full line is buffered, otherwise the line and the
/// bytes it occupied including CRLF.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(idx) = find_crlf(data) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&data[..idx]).map_err(|_| ParseError::MalformedRequestLine)?;
    let line = text.parse()?;
    Ok(Some((line, idx + CRLF.len())))
}

/// Parser progress. Ordered, so a target state can be compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    /// Waiting for the request line.
    Start,
    /// Request line read, reading field lines.
    ParsingHeaders,
    /// Header section complete, reading a body of declared length.
    HeadersDone,
    /// Request fully framed.
    BodyDone,
}

/// A request under construction, or fully parsed once
/// [`is_complete`](Request::is_complete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
    content_length: usize,
    state: ParseState,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Self {
        Self {
            line: None,
            headers: Headers::new(),
            body: Vec::new(),
            content_length: 0,
            state: ParseState::Start,
        }
    }

    /// Feed buffered bytes, advancing through as many states as they allow.
    ///
    /// Returns the number of bytes consumed from the front of `data`.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut consumed = 0;
        while self.state != ParseState::BodyDone {
            let n = self.parse_single(&data[consumed..])?;
            if n == 0 && self.state != ParseState::BodyDone {
                break;
            }
            consumed += n;
        }
        Ok(consumed)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::Start => {
                let Some((line, n)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                self.line = Some(line);
                self.state = ParseState::ParsingHeaders;
                Ok(n)
            }
            ParseState::ParsingHeaders => match self.headers.parse_line(data)? {
                LineStatus::Partial => Ok(0),
                LineStatus::Field { consumed } => Ok(consumed),
                LineStatus::End { consumed } => {
                    self.finish_headers()?;
                    Ok(consumed)
                }
            },
            ParseState::HeadersDone => {
                self.body.extend_from_slice(data);
                if self.body.len() > self.content_length {
                    return Err(ParseError::BodyLengthMismatch {
                        expected: self.content_length,
                        actual: self.body.len(),
                    });
                }
                if self.body.len() == self.content_length {
                    self.state = ParseState::BodyDone;
                }
                Ok(data.len())
            }
            ParseState::BodyDone => Ok(0),
        }
    }

    fn finish_headers(&mut self) -> Result<(), ParseError> {
        let Some(raw) = self.headers.get("content-length") else {
            self.state = ParseState::BodyDone;
            return Ok(());
        };
        self.content_length = raw
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;
        self.state = if self.content_length == 0 {
            ParseState::BodyDone
        } else {
            ParseState::HeadersDone
        };
        Ok(())
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::BodyDone
    }

    /// The request line, available once past [`ParseState::Start`].
    pub fn line(&self) -> Option<&RequestLine> {
        self.line.as_ref()
    }

    /// Method of a request whose line has been parsed.
    pub fn method(&self) -> Option<Method> {
        self.line.as_ref().map(|l| l.method)
    }

    pub fn target(&self) -> &str {
        self.line.as_ref().map_or("", |l| l.target.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Declared body length, zero when absent.
    pub fn content_length(&self) -> usize {
        self.content_length
    }
}
