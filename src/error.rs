//! Error types for the gem sniper

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gem sniper
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Collaborator errors (transient)
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Lookup timed out after {0}ms")]
    LookupTimeout(u64),

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Trade execution failed: {0}")]
    TradeExecution(String),

    // Position invariant violations
    #[error("Position already open for {0}")]
    PositionAlreadyOpen(String),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Position already closed: {0}")]
    PositionAlreadyClosed(String),

    #[error("Close already in progress for {0}")]
    CloseInProgress(String),

    #[error("Open already in progress for {0}")]
    OpenInProgress(String),

    #[error("Max concurrent positions reached: {open} open, max is {max}")]
    MaxPositionsReached { open: usize, max: usize },

    #[error("Invalid fill: {0}")]
    InvalidFill(String),

    // Persistence errors
    #[error("Position persistence failed: {0}")]
    PositionPersistence(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_)
                | Error::Http(_)
                | Error::LookupTimeout(_)
                | Error::PriceUnavailable(_)
                | Error::TradeExecution(_)
        )
    }

    /// Check if this error rejects an operation that would break a position invariant
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::PositionAlreadyOpen(_)
                | Error::PositionAlreadyClosed(_)
                | Error::CloseInProgress(_)
                | Error::OpenInProgress(_)
                | Error::MaxPositionsReached { .. }
        )
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
