use std::time::Duration;

use thiserror::Error;

/// Failure of a single call to a translation backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Minimum wait the provider asked for before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Unsupported translation provider '{0}'")]
    UnsupportedProvider(String),

    #[error("Translation via '{provider}' failed after {attempts} attempt(s): {source}")]
    Exhausted {
        provider: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("Translation cancelled")]
    Cancelled,
}

/// Cache backend failure. Never fatal to a translation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Corrupt cache entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}
