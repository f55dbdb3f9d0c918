//! Scrapeline core: turns a media file name into one merged, optionally
//! translated metadata record.
//!
//! The pipeline is driven by [`MetadataScraper`]:
//!
//! 1. [`FileNameParser`] extracts a search title from the file name.
//! 2. Every enabled data source is queried concurrently through a
//!    [`DataSourceClient`].
//! 3. Candidates whose title scores at or above the similarity threshold
//!    are merged in source order.
//! 4. The merged `Title` and `Overview` are translated by a
//!    [`TranslationClient`] when translation is configured.
#![allow(missing_docs)]

pub mod error;
pub mod infra;
pub mod scraper;
pub mod sources;
pub mod translation;

pub use error::{ScrapeError, SourceError};
pub use infra::cache::DiskTranslationCache;
pub use infra::transport::{TransportError, build_http_client, test_proxy};
pub use scraper::{
    FileNameParser, MetadataScraper, merge_candidates, similarity,
};
pub use sources::{DataSourceClient, HttpDataSourceClient};
pub use translation::{
    CacheKey, ContentFilter, FilterRule, FilterRuleError,
    MemoryTranslationCache, ProviderError, ProviderRegistry, RetryPolicy,
    TranslationCache, TranslationCacheEntry, TranslationClient,
    TranslationError, TranslationProvider,
};
