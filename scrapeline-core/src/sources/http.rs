use std::{collections::HashMap, fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use scrapeline_config::{
    DataSourceEndpoint, ProxySettings, ScraperSettings,
    constants::{DEFAULT_SOURCE_TIMEOUT_SECS, TITLE_PLACEHOLDER},
};
use scrapeline_model::{CandidateRecord, SearchTitle, SourceId};
use tracing::debug;

use super::DataSourceClient;
use crate::{
    error::SourceError,
    infra::transport::{TransportError, build_http_client},
};

/// Queries configured HTTP endpoints that answer with a JSON object shaped
/// like a [`CandidateRecord`].
///
/// The search title is percent-encoded into the endpoint's `{title}`
/// placeholder.
#[derive(Clone)]
pub struct HttpDataSourceClient {
    http: Client,
    endpoints: HashMap<String, DataSourceEndpoint>,
}

impl fmt::Debug for HttpDataSourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> =
            self.endpoints.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("HttpDataSourceClient")
            .field("endpoints", &ids)
            .finish()
    }
}

impl HttpDataSourceClient {
    pub fn new<I>(http: Client, endpoints: I) -> Self
    where
        I: IntoIterator<Item = DataSourceEndpoint>,
    {
        let endpoints = endpoints
            .into_iter()
            .map(|endpoint| (endpoint.id.clone(), endpoint))
            .collect();
        Self { http, endpoints }
    }

    /// Build a client that routes through the configured proxy.
    pub fn from_settings(
        scraper: &ScraperSettings,
        proxy: &ProxySettings,
    ) -> Result<Self, TransportError> {
        let http = build_http_client(
            proxy,
            Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
        )?;
        Ok(Self::new(http, scraper.data_sources.iter().cloned()))
    }

    fn request_url(endpoint: &DataSourceEndpoint, title: &SearchTitle) -> String {
        endpoint
            .url_template
            .replace(TITLE_PLACEHOLDER, &urlencoding::encode(title.as_str()))
    }
}

#[async_trait]
impl DataSourceClient for HttpDataSourceClient {
    async fn fetch_metadata(
        &self,
        source: &SourceId,
        title: &SearchTitle,
    ) -> Result<CandidateRecord, SourceError> {
        let endpoint = self
            .endpoints
            .get(source.as_str())
            .ok_or_else(|| SourceError::UnknownSource(source.to_string()))?;

        let url = Self::request_url(endpoint, title);
        debug!("Fetching metadata from {}: {}", source, url);

        let response = self
            .http
            .get(&url)
            .timeout(endpoint.timeout())
            .send()
            .await
            .map_err(|source_err| SourceError::Http {
                source_id: source.to_string(),
                source: source_err,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_id: source.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source_err| {
            SourceError::Http {
                source_id: source.to_string(),
                source: source_err,
            }
        })?;

        serde_json::from_slice::<CandidateRecord>(&body).map_err(|err| {
            SourceError::Parse {
                source_id: source.to_string(),
                reason: err.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn endpoint(id: &str, url_template: String) -> DataSourceEndpoint {
        DataSourceEndpoint {
            id: id.to_string(),
            url_template,
            timeout_secs: 5,
        }
    }

    fn title(raw: &str) -> SearchTitle {
        SearchTitle::new(raw).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_parses_candidate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/search".into()))
            .match_query(mockito::Matcher::UrlEncoded(
                "q".into(),
                "Example Title".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"Title":"Example Title","Overview":"Plot","Year":2001}"#,
            )
            .create_async()
            .await;

        let client = HttpDataSourceClient::new(
            Client::new(),
            [endpoint("tmdb", format!("{}/search?q={{title}}", server.url()))],
        );
        let source = SourceId::new("tmdb").unwrap();

        let record = client
            .fetch_metadata(&source, &title("Example Title"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(record.title.as_deref(), Some("Example Title"));
        assert_eq!(record.overview.as_deref(), Some("Plot"));
        assert_eq!(record.extra.get("Year"), Some(&serde_json::json!(2001)));
    }

    #[tokio::test]
    async fn unknown_source_is_reported() {
        let client = HttpDataSourceClient::new(Client::new(), Vec::new());
        let source = SourceId::new("nowhere").unwrap();

        let err = client
            .fetch_metadata(&source, &title("Heat"))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::UnknownSource(id) if id == "nowhere"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/heat")
            .with_status(503)
            .create_async()
            .await;

        let client = HttpDataSourceClient::new(
            Client::new(),
            [endpoint("omdb", format!("{}/{{title}}", server.url()))],
        );
        let source = SourceId::new("omdb").unwrap();

        let err = client
            .fetch_metadata(&source, &title("heat"))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/heat")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = HttpDataSourceClient::new(
            Client::new(),
            [endpoint("omdb", format!("{}/{{title}}", server.url()))],
        );
        let source = SourceId::new("omdb").unwrap();

        let err = client
            .fetch_metadata(&source, &title("heat"))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn title_is_percent_encoded_into_template() {
        let endpoint = endpoint(
            "tmdb",
            "https://example.test/search?q={title}".to_string(),
        );
        let url =
            HttpDataSourceClient::request_url(&endpoint, &title("Amélie & Co"));
        assert_eq!(url, "https://example.test/search?q=Am%C3%A9lie%20%26%20Co");
    }
}
