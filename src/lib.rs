//! HTTP/1.1 framing over raw TCP.
//!
//! An incremental request parser fed from a growable buffer, a sequential
//! response framer, and a small connection server tying them together.

pub mod config;
pub mod demo;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use http::{serve, Handler, Request, ResponseWriter, Server};
