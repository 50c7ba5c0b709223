//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// The first four variants are the failures a user can see from the finance
/// API. The rest come from local configuration and storage.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// Missing, invalid or rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server answered with a non-2xx status or an unreadable body
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a server error for the given HTTP status
    pub fn server(status: u16, msg: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: msg.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Short machine-friendly name of the failure class, used in the event log
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Auth(_) => "auth",
            Error::Validation(_) => "validation",
            Error::Server { .. } => "server",
            Error::NotFound(_) => "not_found",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
