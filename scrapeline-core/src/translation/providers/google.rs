use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{GOOGLE, TranslationProvider, error_from_response};
use crate::translation::error::ProviderError;

pub const GOOGLE_ENDPOINT: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    #[serde(default)]
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

/// Google Cloud Translation v2 (API key auth).
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    endpoint: String,
    api_key: String,
    http: Client,
}

impl fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GoogleTranslateProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http,
        }
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    fn id(&self) -> &str {
        GOOGLE
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        debug!("Requesting {} translation from google", target_language);
        // `format=text` keeps the service from HTML-escaping the output.
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", text),
                ("target", target_language),
                ("format", "text"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: GoogleResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Parse(err.to_string()))?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|translation| translation.translated_text)
            .ok_or_else(|| {
                ProviderError::Parse("response has no translations".into())
            })
    }
}
