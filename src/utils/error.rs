//! The `error` module defines the error types used within `roomcast`.
//!
//! Synchronous calls (`join`, `send_message`) return these errors directly.
//! Inbound-path failures (`Decode`, `Handler`) are logged and the node keeps
//! running; they never interrupt a joined session.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport connect/subscribe/disconnect failure. Surfaced to the
    /// caller; retrying is the caller's responsibility.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed call-site input, e.g. a direct message without a recipient.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation requires a joined session.
    #[error("not connected to a room")]
    NotConnected,

    /// Malformed inbound payload. Logged and dropped, never fatal.
    #[error("decode error: {0}")]
    Decode(String),

    /// A registered handler failed. Dispatch continues past it.
    #[error("handler error: {0}")]
    Handler(String),
}
