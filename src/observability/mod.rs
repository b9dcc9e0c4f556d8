//! Observability subsystem.
//!
//! Structured `tracing` events carry `connection_id`, `peer_addr`, `method`,
//! `request_target` and `error` fields; `logging.rs` installs the subscriber the
//! binaries use.

pub mod logging;
