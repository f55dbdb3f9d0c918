use std::{
    fmt,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::translation::{
    CacheError, CacheKey, TranslationCache, TranslationCacheEntry,
};

/// Build the on-disk index key for a translation.
///
/// Versioned, readable up to the text hash, and scoped by provider and
/// target language.
pub fn translation_cache_key_for(key: &CacheKey) -> String {
    let digest = Sha256::digest(key.text.as_bytes());
    format!(
        "translations/v1/{}/{}/{}",
        key.provider,
        key.target_language,
        hex::encode(digest)
    )
}

/// Translation cache persisted with `cacache`. Entries survive restarts
/// and are never evicted.
#[derive(Clone)]
pub struct DiskTranslationCache {
    root: PathBuf,
}

impl fmt::Debug for DiskTranslationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DiskTranslationCache")
            .field(&self.root)
            .finish()
    }
}

impl DiskTranslationCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full stored entry, including when it was written.
    pub async fn entry(
        &self,
        key: &CacheKey,
    ) -> Result<Option<TranslationCacheEntry>, CacheError> {
        let index_key = translation_cache_key_for(key);
        let bytes = match cacache::read(&self.root, &index_key).await {
            Ok(bytes) => bytes,
            Err(cacache::Error::EntryNotFound(_, _)) => return Ok(None),
            Err(cacache::Error::IntegrityError(err)) => {
                return Err(CacheError::Corrupt {
                    key: index_key,
                    reason: err.to_string(),
                });
            }
            Err(cacache::Error::SizeMismatch(wanted, actual)) => {
                return Err(CacheError::Corrupt {
                    key: index_key,
                    reason: format!("size mismatch: wanted={wanted}, actual={actual}"),
                });
            }
            Err(err) => {
                return Err(CacheError::Io(format!("cacache read failed: {err}")));
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| CacheError::Corrupt {
                key: index_key,
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl TranslationCache for DiskTranslationCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        Ok(self.entry(key).await?.map(|entry| entry.translated))
    }

    async fn put(
        &self,
        key: &CacheKey,
        translated: &str,
    ) -> Result<(), CacheError> {
        let index_key = translation_cache_key_for(key);
        let bytes = serde_json::to_vec(&TranslationCacheEntry::now(translated))
            .map_err(|err| CacheError::Io(err.to_string()))?;

        let integrity = cacache::write(&self.root, &index_key, bytes)
            .await
            .map_err(|err| {
                CacheError::Io(format!("cacache write failed: {err}"))
            })?;
        debug!("Stored translation {} ({})", index_key, integrity);
        Ok(())
    }
}
