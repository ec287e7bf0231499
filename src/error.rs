//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout ngodesk.
//! Every failure that reaches a menu loop is one of these variants, so the
//! session can tell a dropped connection from a rejected statement from a
//! mistyped number.
//!
//! # Error Categories
//! - `ConnectionFailed`: the database could not be reached or authenticated against
//! - `QueryFailed`: the engine rejected a statement (syntax, constraint, missing routine)
//! - `InvalidInput`: user-entered text could not be coerced, or an invocation is malformed
//! - `ConfigError`: configuration file or connection registry errors
//! - `InputClosed`: the console reached end of input

use thiserror::Error;

/// Main error type for ngodesk operations
#[derive(Error, Debug)]
pub enum NgoError {
    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Database error: {0}")]
    QueryFailed(String),

    /// Invalid input or malformed invocation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Console has no more input
    #[error("Input closed")]
    InputClosed,
}

impl NgoError {
    /// Stable error code string, used in log fields
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InputClosed => "INPUT_CLOSED",
        }
    }

    /// Human-readable message, safe to print (never contains credentials)
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the failure came from the database boundary
    #[must_use]
    pub const fn is_database(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::QueryFailed(_))
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

impl From<std::io::Error> for NgoError {
    fn from(err: std::io::Error) -> Self {
        if matches!(err.kind(), std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::Interrupted)
        {
            Self::InputClosed
        } else {
            Self::InvalidInput(format!("Could not read input: {err}"))
        }
    }
}

/// Result type alias for ngodesk operations
pub type Result<T> = std::result::Result<T, NgoError>;
