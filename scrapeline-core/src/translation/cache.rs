use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::error::CacheError;

/// Identity of a cached translation. Two requests share an entry only when
/// text, provider and target language all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub provider: String,
    pub target_language: String,
}

impl CacheKey {
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            target_language: target_language.into(),
        }
    }
}

/// A stored, already filtered translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationCacheEntry {
    pub translated: String,
    pub created_at: DateTime<Utc>,
}

impl TranslationCacheEntry {
    pub fn now(translated: impl Into<String>) -> Self {
        Self {
            translated: translated.into(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait TranslationCache: Send + Sync + fmt::Debug {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn put(&self, key: &CacheKey, translated: &str)
    -> Result<(), CacheError>;
}

/// Process-local cache. Entries live as long as the cache.
#[derive(Debug, Default)]
pub struct MemoryTranslationCache {
    entries: DashMap<CacheKey, TranslationCacheEntry>,
}

impl MemoryTranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: &CacheKey) -> Option<TranslationCacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl TranslationCache for MemoryTranslationCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .get(key)
            .map(|entry| entry.value().translated.clone()))
    }

    async fn put(
        &self,
        key: &CacheKey,
        translated: &str,
    ) -> Result<(), CacheError> {
        self.entries
            .insert(key.clone(), TranslationCacheEntry::now(translated));
        Ok(())
    }
}
