//! Error types for aqimap.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur in aqimap operations.
#[derive(Error, Debug)]
pub enum AqiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// API returned an error status
    #[error("MOENV API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// API answered but reported `success: false`
    #[error("MOENV API rejected the request: {0}")]
    Rejected(String),

    /// Invalid response structure
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No API key supplied on the command line, environment or `.env`
    #[error("MOENV_API_KEY is not set (add `MOENV_API_KEY=<your key>` to .env or pass --api-key)")]
    MissingApiKey,

    /// CSV serialization failed
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AqiError {
    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
