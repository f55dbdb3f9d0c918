pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;

use self::error::ConfigLoadError;
use crate::{
    models::{
        Config, ConfigMetadata, ProxyScheme, ProxySettings, ScraperSettings,
        TranslationSettings,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: &[&str] =
    &["scrapeline.toml", "config/scrapeline.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// A composed configuration plus the non-fatal findings from validation.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, read the process environment and the config file, then
    /// compose and validate.
    ///
    /// A missing `.env` in the working directory is fine; a missing file
    /// passed through [`ConfigLoader::with_env_file`] is an error.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingEnvFile {
                        path: path.clone(),
                    });
                }
                dotenvy::from_path(path)?;
                true
            }
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose from an explicit environment snapshot. `.env` files are not
    /// consulted.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;

        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No scrapeline.toml detected; using defaults and environment variables",
                "Create scrapeline.toml or pass --config",
            );
        }
        for rejected in &env.rejected {
            warnings.push_with_hint(
                format!(
                    "Ignoring {}='{}'; the value is not {}",
                    rejected.name, rejected.value, rejected.expected
                ),
                format!("Fix or unset {}", rejected.name),
            );
        }

        let config = compose_config(file_config.unwrap_or_default(), env, config_path)?;
        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(Path::new)
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.to_path_buf(),
                None => return Ok((None, None)),
            },
        };

        debug!("loading configuration from {}", path.display());
        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Environment values win over file values, which win over defaults.
fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        scraper: file_scraper,
        translation: file_translation,
        proxy: file_proxy,
    } = file;

    let scraper_defaults = ScraperSettings::default();
    let scraper = ScraperSettings {
        file_name_regex: env
            .file_name_regex
            .or(file_scraper.file_name_regex)
            .unwrap_or(scraper_defaults.file_name_regex),
        match_similarity_threshold: env
            .match_threshold
            .or(file_scraper.match_similarity_threshold)
            .unwrap_or(scraper_defaults.match_similarity_threshold),
        enabled_data_sources: env
            .enabled_sources
            .or(file_scraper.enabled_data_sources)
            .unwrap_or_default(),
        data_sources: file_scraper.data_sources,
    };

    let translation_defaults = TranslationSettings::default();
    let translation = TranslationSettings {
        enabled: env
            .translation_enabled
            .or(file_translation.enabled)
            .unwrap_or(translation_defaults.enabled),
        provider: env
            .translation_provider
            .or(file_translation.provider)
            .map(|p| p.trim().to_ascii_lowercase())
            .unwrap_or(translation_defaults.provider),
        api_key: env
            .api_key
            .or(file_translation.api_key)
            .unwrap_or_default(),
        api_endpoint: env
            .api_endpoint
            .or(file_translation.api_endpoint)
            .filter(|value| !value.trim().is_empty()),
        model: env
            .translation_model
            .or(file_translation.model)
            .filter(|value| !value.trim().is_empty()),
        target_language: env
            .target_language
            .or(file_translation.target_language)
            .unwrap_or(translation_defaults.target_language),
        timeout: env
            .translation_timeout_secs
            .or(file_translation.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(translation_defaults.timeout),
        retry_count: env
            .translation_retry_count
            .or(file_translation.retry_count)
            .unwrap_or(translation_defaults.retry_count),
        cache_enabled: env
            .translation_cache
            .or(file_translation.cache_enabled)
            .unwrap_or(translation_defaults.cache_enabled),
        cache_dir: env.translation_cache_dir.or(file_translation.cache_dir),
        filter_rules: file_translation.filter_rules,
    };

    let proxy_defaults = ProxySettings::default();
    let scheme = match env.proxy_scheme.or(file_proxy.scheme) {
        Some(raw) => ProxyScheme::parse(&raw)
            .ok_or(ConfigLoadError::UnknownProxyScheme { scheme: raw })?,
        None => proxy_defaults.scheme,
    };
    let proxy = ProxySettings {
        enabled: env
            .proxy_enabled
            .or(file_proxy.enabled)
            .unwrap_or(proxy_defaults.enabled),
        scheme,
        host: env.proxy_host.or(file_proxy.host).unwrap_or_default(),
        port: env
            .proxy_port
            .or(file_proxy.port)
            .unwrap_or(proxy_defaults.port),
        username: env
            .proxy_username
            .or(file_proxy.username)
            .filter(|value| !value.is_empty()),
        password: env
            .proxy_password
            .or(file_proxy.password)
            .filter(|value| !value.is_empty()),
        bypass: env
            .proxy_bypass
            .or(file_proxy.bypass)
            .unwrap_or_default(),
    };

    Ok(Config {
        scraper,
        translation,
        proxy,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    })
}
