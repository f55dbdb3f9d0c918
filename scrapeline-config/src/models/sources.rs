use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};

use crate::util::{parse_bool, parse_csv};

use super::{DataSourceEndpoint, FilterRuleSetting};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub scraper: FileScraperConfig,
    #[serde(default)]
    pub translation: FileTranslationConfig,
    #[serde(default)]
    pub proxy: FileProxyConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileScraperConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name_regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_similarity_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_data_sources: Option<Vec<String>>,
    #[serde(default)]
    pub data_sources: Vec<DataSourceEndpoint>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTranslationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub filter_rules: Vec<FilterRuleSetting>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileProxyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub translation_enabled: Option<bool>,
    pub translation_provider: Option<String>,
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
    pub translation_model: Option<String>,
    pub target_language: Option<String>,
    pub translation_timeout_secs: Option<u64>,
    pub translation_retry_count: Option<u32>,
    pub translation_cache: Option<bool>,
    pub translation_cache_dir: Option<PathBuf>,
    pub enabled_sources: Option<Vec<String>>,
    pub file_name_regex: Option<String>,
    pub match_threshold: Option<f64>,
    pub proxy_enabled: Option<bool>,
    pub proxy_scheme: Option<String>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    pub proxy_bypass: Option<Vec<String>>,
    /// Variables that were set but could not be parsed, in lookup order.
    pub rejected: Vec<RejectedEnvVar>,
}

/// An environment variable whose value did not parse for its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEnvVar {
    pub name: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };
        let csv = |name: &str| var(name).map(|s| parse_csv(&s));
        let mut rejected = Vec::new();
        let mut flag = |name: &'static str| {
            parse_typed(name, var(name), "a boolean", &mut rejected, parse_bool)
        };
        let translation_enabled = flag("SCRAPELINE_TRANSLATION_ENABLED");
        let translation_cache = flag("SCRAPELINE_TRANSLATION_CACHE");
        let proxy_enabled = flag("SCRAPELINE_PROXY_ENABLED");

        let translation_timeout_secs = parse_number(
            "SCRAPELINE_TRANSLATION_TIMEOUT",
            var("SCRAPELINE_TRANSLATION_TIMEOUT"),
            "a whole number of seconds",
            &mut rejected,
        );
        let translation_retry_count = parse_number(
            "SCRAPELINE_TRANSLATION_RETRY_COUNT",
            var("SCRAPELINE_TRANSLATION_RETRY_COUNT"),
            "a non-negative integer",
            &mut rejected,
        );
        let match_threshold = parse_number(
            "SCRAPELINE_MATCH_THRESHOLD",
            var("SCRAPELINE_MATCH_THRESHOLD"),
            "a number",
            &mut rejected,
        );
        let proxy_port = parse_number(
            "SCRAPELINE_PROXY_PORT",
            var("SCRAPELINE_PROXY_PORT"),
            "a port between 0 and 65535",
            &mut rejected,
        );

        Self {
            config_path: var("SCRAPELINE_CONFIG").map(PathBuf::from),
            translation_enabled,
            translation_provider: var("SCRAPELINE_TRANSLATION_PROVIDER"),
            api_key: var("SCRAPELINE_API_KEY"),
            api_endpoint: var("SCRAPELINE_API_ENDPOINT"),
            translation_model: var("SCRAPELINE_TRANSLATION_MODEL"),
            target_language: var("SCRAPELINE_TARGET_LANGUAGE"),
            translation_timeout_secs,
            translation_retry_count,
            translation_cache,
            translation_cache_dir: var("SCRAPELINE_TRANSLATION_CACHE_DIR")
                .map(PathBuf::from),
            enabled_sources: csv("SCRAPELINE_ENABLED_SOURCES"),
            file_name_regex: var("SCRAPELINE_FILE_NAME_REGEX"),
            match_threshold,
            proxy_enabled,
            proxy_scheme: var("SCRAPELINE_PROXY_SCHEME"),
            proxy_host: var("SCRAPELINE_PROXY_HOST"),
            proxy_port,
            proxy_username: var("SCRAPELINE_PROXY_USERNAME"),
            proxy_password: var("SCRAPELINE_PROXY_PASSWORD"),
            proxy_bypass: csv("SCRAPELINE_PROXY_BYPASS"),
            rejected,
        }
    }
}

fn parse_number<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    expected: &'static str,
    rejected: &mut Vec<RejectedEnvVar>,
) -> Option<T> {
    parse_typed(name, raw, expected, rejected, |s| s.parse().ok())
}

fn parse_typed<T>(
    name: &'static str,
    raw: Option<String>,
    expected: &'static str,
    rejected: &mut Vec<RejectedEnvVar>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        rejected.push(RejectedEnvVar {
            name,
            value: raw,
            expected,
        });
    }
    parsed
}
