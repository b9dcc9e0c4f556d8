//! HTTP/1.1 framing subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → buffer.rs (growable lookahead, compaction)
//!     → request.rs (request line → headers → body state machine)
//!         ↳ headers.rs (field lines, case folding, comma folding)
//!     → reader.rs (drives the parser over the buffer until done)
//!     → server.rs (per-connection task, handler dispatch, 400 on failure)
//!     → response.rs (status line → headers → body | chunks → trailers)
//!     → TCP connection
//! ```

pub mod buffer;
pub mod error;
pub mod headers;
pub mod reader;
pub mod request;
pub mod response;
pub mod server;

pub use buffer::ReadBuffer;
pub use error::{ParseError, WriteError};
pub use headers::{Headers, LineStatus};
pub use reader::{read_request, RequestReader};
pub use request::{Method, ParseState, Request, RequestLine};
pub use response::{default_headers, ResponseWriter, StatusCode};
pub use server::{serve, ConnectionWriter, Handler, Server, ServerError, BAD_REQUEST_BODY};
