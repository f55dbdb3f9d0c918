use std::sync::Arc;

use anyhow::{Context, Result};
use scrapeline_config::Config;
use scrapeline_core::{
    DiskTranslationCache, HttpDataSourceClient, MemoryTranslationCache,
    MetadataScraper, TranslationCache, TranslationClient, build_http_client,
};
use tracing::{debug, info};

/// Wire a scraper (and, when enabled, its translation stage) from
/// configuration.
pub fn build_scraper(config: &Config) -> Result<MetadataScraper> {
    let sources = HttpDataSourceClient::from_settings(&config.scraper, &config.proxy)
        .context("failed to build data source client")?;
    let scraper = MetadataScraper::new(&config.scraper, Arc::new(sources))
        .context("invalid scraper configuration")?;

    if !config.translation.enabled {
        debug!("Translation disabled");
        return Ok(scraper);
    }

    let translator = build_translator(config)?;
    Ok(scraper.with_translation(
        Arc::new(translator),
        config.translation.target_language.clone(),
    ))
}

pub fn build_translator(config: &Config) -> Result<TranslationClient> {
    let settings = &config.translation;
    let http = build_http_client(&config.proxy, settings.timeout)
        .context("failed to build translation HTTP client")?;
    let client = TranslationClient::from_settings(settings, http)
        .context("invalid translation filter rules")?;

    if !settings.cache_enabled {
        return Ok(client);
    }

    let cache: Arc<dyn TranslationCache> = match &settings.cache_dir {
        Some(dir) => {
            info!("Using translation cache at {}", dir.display());
            Arc::new(DiskTranslationCache::new(dir.clone()))
        }
        None => Arc::new(MemoryTranslationCache::new()),
    };
    Ok(client.with_cache(cache))
}
