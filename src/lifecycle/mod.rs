//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve shutdown_signal()
//!
//! Shutdown (shutdown.rs):
//!     Server::close → Shutdown::trigger → accept loop exits → listener dropped
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
