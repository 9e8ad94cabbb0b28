//! Application error types
//!
//! Unified error handling for the gateway's outer surfaces.

use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Request errors
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Server errors
    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCommand(_) | Self::InvalidInput(_) => 400,
            Self::Config(_) | Self::Server(_) => 500,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCommand(_) => "INVALID_COMMAND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Server(_) => "SERVER_ERROR",
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Create an invalid command error
    #[must_use]
    pub fn invalid_command(msg: impl fmt::Display) -> Self {
        Self::InvalidCommand(msg.to_string())
    }

    /// Create a server error
    #[must_use]
    pub fn server(msg: impl fmt::Display) -> Self {
        Self::Server(msg.to_string())
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
