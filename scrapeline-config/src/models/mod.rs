pub mod sources;

use std::{fmt, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FILE_NAME_REGEX, DEFAULT_MATCH_SIMILARITY_THRESHOLD,
    DEFAULT_PROXY_PORT, DEFAULT_SOURCE_TIMEOUT_SECS, DEFAULT_TARGET_LANGUAGE,
    DEFAULT_TRANSLATION_PROVIDER, DEFAULT_TRANSLATION_RETRY_COUNT,
    DEFAULT_TRANSLATION_TIMEOUT_SECS,
};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub scraper: ScraperSettings,
    pub translation: TranslationSettings,
    pub proxy: ProxySettings,
    pub metadata: ConfigMetadata,
}

/// Filename parsing, data source fan-out and acceptance settings.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    /// Pattern with a `title` capture group, matched against the file name.
    pub file_name_regex: String,
    /// Candidates scoring below this similarity are discarded.
    pub match_similarity_threshold: f64,
    /// Ordered list; the order is the merge precedence.
    pub enabled_data_sources: Vec<String>,
    /// HTTP endpoints for sources served by the built-in JSON client.
    pub data_sources: Vec<DataSourceEndpoint>,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            file_name_regex: DEFAULT_FILE_NAME_REGEX.to_string(),
            match_similarity_threshold: DEFAULT_MATCH_SIMILARITY_THRESHOLD,
            enabled_data_sources: Vec::new(),
            data_sources: Vec::new(),
        }
    }
}

impl ScraperSettings {
    pub fn endpoint(&self, id: &str) -> Option<&DataSourceEndpoint> {
        self.data_sources.iter().find(|source| source.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataSourceEndpoint {
    pub id: String,
    /// URL containing a `{title}` placeholder.
    pub url_template: String,
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_source_timeout_secs() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_SECS
}

impl DataSourceEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone)]
pub struct TranslationSettings {
    pub enabled: bool,
    pub provider: String,
    pub api_key: String,
    /// Overrides the selected provider's default endpoint when set.
    pub api_endpoint: Option<String>,
    /// Overrides the chat-completion model when set.
    pub model: Option<String>,
    pub target_language: String,
    pub timeout: Duration,
    pub retry_count: u32,
    pub cache_enabled: bool,
    /// On-disk cache location; the cache stays in memory when unset.
    pub cache_dir: Option<PathBuf>,
    /// Appended after the built-in normalization rules, in order.
    pub filter_rules: Vec<FilterRuleSetting>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: DEFAULT_TRANSLATION_PROVIDER.to_string(),
            api_key: String::new(),
            api_endpoint: None,
            model: None,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TRANSLATION_TIMEOUT_SECS),
            retry_count: DEFAULT_TRANSLATION_RETRY_COUNT,
            cache_enabled: true,
            cache_dir: None,
            filter_rules: Vec::new(),
        }
    }
}

impl fmt::Debug for TranslationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationSettings")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("api_key", &redacted(&self.api_key))
            .field("api_endpoint", &self.api_endpoint)
            .field("model", &self.model)
            .field("target_language", &self.target_language)
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_dir", &self.cache_dir)
            .field("filter_rules", &self.filter_rules.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterRuleSetting {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    #[default]
    Http,
    Https,
    #[serde(alias = "socks")]
    Socks5,
}

impl ProxyScheme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            "socks" | "socks5" => Some(Self::Socks5),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound proxy used by translation providers, HTTP data sources and the
/// connectivity probe.
#[derive(Clone)]
pub struct ProxySettings {
    pub enabled: bool,
    pub scheme: ProxyScheme,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Domains that skip the proxy entirely.
    pub bypass: Vec<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            scheme: ProxyScheme::default(),
            host: String::new(),
            port: DEFAULT_PROXY_PORT,
            username: None,
            password: None,
            bypass: Vec::new(),
        }
    }
}

impl ProxySettings {
    /// A proxy with no host is treated as disabled.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.host.trim().is_empty()
    }

    pub fn proxy_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host.trim(), self.port)
    }

    /// Basic credentials, only when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user, pass))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySettings")
            .field("enabled", &self.enabled)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field(
                "password",
                &self.password.as_deref().map(redacted),
            )
            .field("bypass", &self.bypass)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
