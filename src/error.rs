// src/error.rs

//! Unified error handling for the purger.

use std::fmt;

use thiserror::Error;

/// Result type alias for purger operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Base64 payload decoding failed
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A paper identifier could not be parsed
    #[error("Invalid paper id '{0}'")]
    InvalidPaperId(String),

    /// A category string contained a token missing from the taxonomy
    #[error("Unknown category '{category}' in '{categories}'")]
    UnknownCategory {
        category: String,
        categories: String,
    },

    /// Malformed event envelope; the message is unrecoverable
    #[error("Bad event envelope: {0}")]
    Envelope(String),

    /// The CDN rejected or failed a purge request
    #[error("Purge failed for {target} (status {status:?}): {message}")]
    Purge {
        target: String,
        status: Option<u16>,
        message: String,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an envelope error.
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::Envelope(message.into())
    }

    /// Create an unknown category error.
    pub fn unknown_category(category: impl Into<String>, categories: impl Into<String>) -> Self {
        Self::UnknownCategory {
            category: category.into(),
            categories: categories.into(),
        }
    }

    /// Create a purge error with the HTTP status, if one was received.
    pub fn purge(target: impl Into<String>, status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Purge {
            target: target.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Whether retrying the failed operation may succeed.
    ///
    /// Network failures, 5xx, request timeouts and rate limiting are
    /// transient. Any other 4xx is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Purge { status: None, .. } => true,
            Self::Purge {
                status: Some(code), ..
            } => *code >= 500 || *code == 408 || *code == 429,
            _ => false,
        }
    }

    /// Whether redelivering the message that caused this error cannot help.
    ///
    /// Malformed payloads and bad paper data are acknowledged; storage,
    /// configuration and network failures are handed back for redelivery.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            Self::Envelope(_)
                | Self::Base64(_)
                | Self::Json(_)
                | Self::InvalidPaperId(_)
                | Self::UnknownCategory { .. }
                | Self::Validation(_)
        )
    }
}
