use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::constants::{TITLE_CAPTURE_GROUP, TITLE_PLACEHOLDER};

use super::models::{Config, ProxySettings, ScraperSettings};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("match similarity threshold {value} must be within [0, 1]")]
    InvalidThreshold { value: f64 },
    #[error("file name pattern '{pattern}' does not compile: {reason}")]
    InvalidFileNameRegex { pattern: String, reason: String },
    #[error("file name pattern '{pattern}' has no `title` capture group")]
    MissingTitleGroup { pattern: String },
    #[error("proxy is enabled but port is 0")]
    InvalidProxyPort,
    #[error("data source '{id}' has an invalid url template: {reason}")]
    InvalidSourceTemplate { id: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    validate_scraper(&config.scraper, &mut warnings)?;
    validate_proxy(&config.proxy, &mut warnings)?;

    if config.translation.enabled && config.translation.api_key.trim().is_empty()
    {
        warnings.push_with_hint(
            format!(
                "translation is enabled for provider '{}' but no API key is set",
                config.translation.provider
            ),
            "Set translation.api_key or SCRAPELINE_API_KEY",
        );
    }

    Ok(warnings)
}

/// Compile the file name pattern and check it exposes a `title` group.
pub fn check_file_name_regex(
    pattern: &str,
) -> Result<Regex, ConfigGuardRailError> {
    let regex = Regex::new(pattern).map_err(|err| {
        ConfigGuardRailError::InvalidFileNameRegex {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    })?;

    if !regex
        .capture_names()
        .flatten()
        .any(|name| name == TITLE_CAPTURE_GROUP)
    {
        return Err(ConfigGuardRailError::MissingTitleGroup {
            pattern: pattern.to_string(),
        });
    }

    Ok(regex)
}

fn validate_scraper(
    scraper: &ScraperSettings,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    let threshold = scraper.match_similarity_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigGuardRailError::InvalidThreshold { value: threshold });
    }

    check_file_name_regex(&scraper.file_name_regex)?;

    for source in &scraper.data_sources {
        if !source.url_template.contains(TITLE_PLACEHOLDER) {
            return Err(ConfigGuardRailError::InvalidSourceTemplate {
                id: source.id.clone(),
                reason: format!("missing {TITLE_PLACEHOLDER} placeholder"),
            });
        }
        let probe = source.url_template.replace(TITLE_PLACEHOLDER, "probe");
        if let Err(err) = Url::parse(&probe) {
            return Err(ConfigGuardRailError::InvalidSourceTemplate {
                id: source.id.clone(),
                reason: err.to_string(),
            });
        }
    }

    if scraper.enabled_data_sources.is_empty() {
        warnings.push_with_hint(
            "no data sources are enabled; every scrape will return no match",
            "List source ids in scraper.enabled_data_sources",
        );
    }

    for id in &scraper.enabled_data_sources {
        if scraper.endpoint(id).is_none() {
            warnings.push(format!(
                "enabled data source '{id}' has no [[scraper.data_sources]] endpoint"
            ));
        }
    }

    Ok(())
}

fn validate_proxy(
    proxy: &ProxySettings,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if !proxy.enabled {
        return Ok(());
    }

    if proxy.host.trim().is_empty() {
        warnings.push_with_hint(
            "proxy is enabled but no host is set; outbound calls go direct",
            "Set proxy.host or SCRAPELINE_PROXY_HOST",
        );
        return Ok(());
    }

    if proxy.port == 0 {
        return Err(ConfigGuardRailError::InvalidProxyPort);
    }

    Ok(())
}
