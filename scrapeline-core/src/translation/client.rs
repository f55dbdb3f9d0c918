use std::sync::Arc;

use scrapeline_config::TranslationSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    ContentFilter, FilterRuleError, ProviderRegistry, RetryPolicy,
    TranslationError,
    cache::{CacheKey, TranslationCache},
};

/// Translates metadata text through the configured provider.
///
/// Per call: empty text passes through untouched; a cache hit skips the
/// network; a miss runs the provider under [`RetryPolicy`], filters the
/// result and stores the filtered text. Cache failures are logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct TranslationClient {
    registry: ProviderRegistry,
    provider_id: String,
    cache: Option<Arc<dyn TranslationCache>>,
    filter: ContentFilter,
    retry: RetryPolicy,
}

impl TranslationClient {
    pub fn new(registry: ProviderRegistry, provider_id: impl Into<String>) -> Self {
        Self {
            registry,
            provider_id: provider_id.into().to_ascii_lowercase(),
            cache: None,
            filter: ContentFilter::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Client for the configured provider with built-in adapters, the
    /// configured retry count and the academic filter plus any extra
    /// rules.
    pub fn from_settings(
        settings: &TranslationSettings,
        http: reqwest::Client,
    ) -> Result<Self, FilterRuleError> {
        let filter = ContentFilter::academic_with(
            settings
                .filter_rules
                .iter()
                .map(|rule| (rule.pattern.clone(), rule.replacement.clone())),
        )?;

        Ok(Self::new(
            ProviderRegistry::with_builtin(settings, http),
            settings.provider.clone(),
        )
        .with_filter(filter)
        .with_retry_policy(RetryPolicy::from_retry_count(settings.retry_count)))
    }

    pub fn with_cache(mut self, cache: Arc<dyn TranslationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let provider = self.registry.get(&self.provider_id).ok_or_else(|| {
            TranslationError::UnsupportedProvider(self.provider_id.clone())
        })?;

        let key = CacheKey::new(text, &self.provider_id, target_language);
        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(hit)) => {
                    debug!(
                        "Translation cache hit ({} -> {})",
                        self.provider_id, target_language
                    );
                    return Ok(hit);
                }
                Ok(None) => {}
                Err(err) => warn!("Translation cache lookup failed: {}", err),
            }
        }

        let raw = self
            .retry
            .run(&self.provider_id, cancel, |_| {
                provider.translate(text, target_language)
            })
            .await?;
        let filtered = self.filter.apply(&raw);

        if let Some(cache) = &self.cache
            && let Err(err) = cache.put(&key, &filtered).await
        {
            warn!("Failed to store translation in cache: {}", err);
        }

        Ok(filtered)
    }
}
