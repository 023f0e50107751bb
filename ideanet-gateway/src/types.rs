//! Shared error type for the gateway

use thiserror::Error;

/// Errors surfaced by gateway collaborators.
///
/// The pure core has no error paths; everything here comes from the
/// surrounding glue (sockets, the node store, the AI scorer).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("AI error: {0}")]
    Ai(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
