use scrapeline_config::ConfigGuardRailError;
use thiserror::Error;

use crate::translation::TranslationError;

/// Errors surfaced by [`crate::MetadataScraper`].
///
/// Individual data source failures never show up here: they are logged and
/// the source is treated as contributing nothing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Scrape cancelled")]
    Cancelled,
}

impl From<ConfigGuardRailError> for ScrapeError {
    fn from(err: ConfigGuardRailError) -> Self {
        ScrapeError::InvalidConfig(err.to_string())
    }
}

/// Errors from a single data source lookup.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No endpoint configured for data source '{0}'")]
    UnknownSource(String),

    #[error("Request to '{source_id}' failed: {source}")]
    Http {
        source_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Data source '{source_id}' returned HTTP {status}")]
    Status { source_id: String, status: u16 },

    #[error("Data source '{source_id}' returned malformed metadata: {reason}")]
    Parse { source_id: String, reason: String },

    #[error("{0}")]
    Other(String),
}
