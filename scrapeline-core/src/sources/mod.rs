//! Data source access.
//!
//! The scraper only sees the [`DataSourceClient`] seam; the shipped
//! implementation is [`HttpDataSourceClient`], which resolves each source id
//! to a configured URL template.

mod http;

use async_trait::async_trait;
use scrapeline_model::{CandidateRecord, SearchTitle, SourceId};

use crate::error::SourceError;

pub use http::HttpDataSourceClient;

/// Fetches one candidate record for a title from a named source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSourceClient: Send + Sync {
    async fn fetch_metadata(
        &self,
        source: &SourceId,
        title: &SearchTitle,
    ) -> Result<CandidateRecord, SourceError>;
}
