//! Shared configuration library for Scrapeline.
//!
//! This crate centralizes config defaults, file/env composition and the
//! validation guard rails. The core pipeline consumes the typed settings
//! from [`models`]; the CLI drives [`ConfigLoader`].
#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig, RejectedEnvVar};
pub use models::{
    Config, ConfigMetadata, DataSourceEndpoint, FilterRuleSetting,
    ProxyScheme, ProxySettings, ScraperSettings, TranslationSettings,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
