//! Translation backends.
//!
//! Each backend implements [`TranslationProvider`] for a single attempt;
//! retries, caching and filtering live in the client.

mod chat;
mod google;

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Response, StatusCode, header::RETRY_AFTER};
use scrapeline_config::TranslationSettings;

use super::error::ProviderError;

pub use chat::{
    ChatCompletionProvider, DEEPSEEK_ENDPOINT, DEEPSEEK_MODEL, OPENAI_ENDPOINT,
    OPENAI_MODEL,
};
pub use google::{GOOGLE_ENDPOINT, GoogleTranslateProvider};

pub const DEEPSEEK: &str = "deepseek";
pub const OPENAI: &str = "openai";
pub const GOOGLE: &str = "google";

const ERROR_BODY_LIMIT: usize = 512;

#[async_trait]
pub trait TranslationProvider: Send + Sync + fmt::Debug {
    /// Registry id, lower case.
    fn id(&self) -> &str;

    /// One translation attempt.
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;
}

/// Provider id to adapter lookup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn TranslationProvider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the DeepSeek, OpenAI and Google adapters.
    ///
    /// Endpoint and model overrides from `settings` apply to the selected
    /// provider only; the others keep their public defaults.
    pub fn with_builtin(
        settings: &TranslationSettings,
        http: reqwest::Client,
    ) -> Self {
        let selected = settings.provider.to_ascii_lowercase();
        let endpoint_for = |id: &str, default: &str| {
            settings
                .api_endpoint
                .as_deref()
                .filter(|_| selected == id)
                .unwrap_or(default)
                .to_string()
        };
        let model_for = |id: &str, default: &str| {
            settings
                .model
                .as_deref()
                .filter(|_| selected == id)
                .unwrap_or(default)
                .to_string()
        };

        let mut registry = Self::new();
        registry.register(Arc::new(ChatCompletionProvider::new(
            DEEPSEEK,
            endpoint_for(DEEPSEEK, DEEPSEEK_ENDPOINT),
            model_for(DEEPSEEK, DEEPSEEK_MODEL),
            settings.api_key.clone(),
            http.clone(),
        )));
        registry.register(Arc::new(ChatCompletionProvider::new(
            OPENAI,
            endpoint_for(OPENAI, OPENAI_ENDPOINT),
            model_for(OPENAI, OPENAI_MODEL),
            settings.api_key.clone(),
            http.clone(),
        )));
        registry.register(Arc::new(GoogleTranslateProvider::new(
            endpoint_for(GOOGLE, GOOGLE_ENDPOINT),
            settings.api_key.clone(),
            http,
        )));
        registry
    }

    /// Register `provider` under its id, returning any adapter it replaced.
    pub fn register(
        &mut self,
        provider: Arc<dyn TranslationProvider>,
    ) -> Option<Arc<dyn TranslationProvider>> {
        self.providers
            .insert(provider.id().to_ascii_lowercase(), provider)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn TranslationProvider>> {
        self.providers.get(&id.to_ascii_lowercase()).cloned()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> =
            self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Map a non-success response to a [`ProviderError`].
async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return ProviderError::RateLimited { retry_after };
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let cut = (0..=ERROR_BODY_LIMIT)
            .rev()
            .find(|idx| body.is_char_boundary(*idx))
            .unwrap_or(0);
        body.truncate(cut);
    }
    ProviderError::Status {
        status: status.as_u16(),
        body,
    }
}
