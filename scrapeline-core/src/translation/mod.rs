//! Translation of merged metadata text.
//!
//! [`TranslationClient`] resolves the configured provider from a
//! [`ProviderRegistry`], consults the cache, retries failed calls with a
//! linear backoff and finally runs the [`ContentFilter`] over the output.

mod cache;
mod client;
mod error;
mod filter;
pub mod providers;
mod retry;

pub use cache::{
    CacheKey, MemoryTranslationCache, TranslationCache, TranslationCacheEntry,
};
pub use client::TranslationClient;
pub use error::{CacheError, ProviderError, TranslationError};
pub use filter::{ContentFilter, FilterRule, FilterRuleError};
pub use providers::{ProviderRegistry, TranslationProvider};
pub use retry::{MAX_RETRY_AFTER, RetryPolicy};
