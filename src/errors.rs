/*!
 * Error types for the vnloc application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised while reading the markup of a single script line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// A link tag without its counterpart (dangling open, stray close, nested open,
    /// or a line break inside a link)
    #[error("Malformed tag on line {line_index}: {tag}")]
    MalformedTag {
        /// Zero-based line index in the source file
        line_index: usize,
        /// The offending tag as written in the source
        tag: String,
    },

    /// The number of translated link phrases does not match the layout
    #[error("Expected {expected} link translations, got {found}")]
    LinkCountMismatch {
        /// Links present in the tag layout
        expected: usize,
        /// Link translations supplied
        found: usize,
    },
}

/// Errors from the translation slot registry and its storage
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The backing storage could not be read or written
    #[error("Registry storage error: {0}")]
    Storage(String),

    /// A translation was recorded for a slot that was never extracted
    #[error("Unknown translation slot: {0}")]
    UnknownSlot(String),

    /// A stored key could not be parsed back into a slot key
    #[error("Invalid slot key: {0}")]
    InvalidKey(String),
}

impl From<rusqlite::Error> for RegistryError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<anyhow::Error> for RegistryError {
    fn from(error: anyhow::Error) -> Self {
        Self::Storage(format!("{:#}", error))
    }
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry of the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from script markup handling
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Error from the slot registry
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
