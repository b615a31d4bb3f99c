//! Error types for the booking workflow
//!
//! This module provides a unified error handling system shared by the trade
//! and settlement services. Errors split into two families: validation
//! problems that are always recovered locally (the save is never attempted)
//! and network/API problems surfaced with the server's status and message
//! where available.

use std::fmt::Display;
use thiserror::Error;

/// Booking workflow error type
#[derive(Debug, Error)]
pub enum Error {
    /// Structural trade or leg validation failure
    #[error("{0}")]
    Validation(String),

    /// Leg maturity dates disagree with the trade-level maturity
    #[error("Maturity conflict: {0}")]
    MaturityConflict(String),

    /// Settlement text failed its length/character rules
    #[error("Invalid settlement instructions: {0}")]
    InvalidSettlement(String),

    /// Error when a trade cannot be found
    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    /// Permission failure (HTTP 403) translated into an explicit message
    #[error("Insufficient privilege: {0}")]
    InsufficientPrivilege(String),

    /// Non-success response from the backend, with the server's status
    #[error("Backend error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// HTTP transport error
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for errors the caller can fix by editing the trade or the
    /// settlement text, rather than by retrying the request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::MaturityConflict(_) | Error::InvalidSettlement(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::Validation(msg) => Error::Validation(format!("{}: {}", context, msg)),
                Error::MaturityConflict(msg) => {
                    Error::MaturityConflict(format!("{}: {}", context, msg))
                }
                Error::InvalidSettlement(msg) => {
                    Error::InvalidSettlement(format!("{}: {}", context, msg))
                }
                Error::TradeNotFound(msg) => Error::TradeNotFound(format!("{}: {}", context, msg)),
                Error::InsufficientPrivilege(msg) => {
                    Error::InsufficientPrivilege(format!("{}: {}", context, msg))
                }
                Error::Api { status, message } => Error::Api {
                    status,
                    message: format!("{}: {}", context, message),
                },
                Error::Configuration(msg) => Error::Configuration(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Transport(e) => Error::Transport(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Internal(format!("decimal conversion: {}", err))
    }
}
