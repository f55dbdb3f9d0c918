//! Outbound HTTP client construction.
//!
//! Every request the pipeline makes (data sources, translation providers,
//! proxy probes) goes through a client built here so that proxy settings
//! apply uniformly.

use std::time::Duration;

use reqwest::{Client, NoProxy, Proxy};
use scrapeline_config::ProxySettings;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Hosts that always bypass the proxy.
const LOCAL_BYPASS: &[&str] = &["localhost", "127.0.0.1", "::1"];

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid proxy url '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Proxy probe request failed: {0}")]
    Probe(#[source] reqwest::Error),

    #[error("Proxy probe returned HTTP {0}")]
    ProbeStatus(u16),
}

/// Comma separated bypass list: loopback hosts plus configured entries.
pub fn bypass_list(proxy: &ProxySettings) -> String {
    LOCAL_BYPASS
        .iter()
        .map(|host| host.to_string())
        .chain(
            proxy
                .bypass
                .iter()
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty()),
        )
        .collect::<Vec<_>>()
        .join(",")
}

/// Build an HTTP client honouring `proxy`.
///
/// With the proxy disabled (or without a host) connections are direct and
/// system proxy variables are ignored.
pub fn build_http_client(
    proxy: &ProxySettings,
    timeout: Duration,
) -> Result<Client, TransportError> {
    let builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("scrapeline/", env!("CARGO_PKG_VERSION")));

    let builder = if proxy.is_active() {
        let url = proxy.proxy_url();
        let mut upstream =
            Proxy::all(&url).map_err(|source| TransportError::InvalidProxy {
                url: url.clone(),
                source,
            })?;
        if let Some((username, password)) = proxy.credentials() {
            upstream = upstream.basic_auth(username, password);
        }
        upstream = upstream.no_proxy(NoProxy::from_string(&bypass_list(proxy)));
        debug!("Routing outbound HTTP through {} proxy", proxy.scheme);
        builder.proxy(upstream)
    } else {
        builder.no_proxy()
    };

    builder.build().map_err(TransportError::Build)
}

/// Probe connectivity through the configured proxy.
///
/// Returns `Ok(false)` without any network traffic when the proxy is
/// disabled, `Ok(true)` when `probe_url` answers with a success status.
pub async fn test_proxy(
    proxy: &ProxySettings,
    probe_url: &str,
    timeout: Duration,
) -> Result<bool, TransportError> {
    if !proxy.is_active() {
        info!("Proxy disabled; skipping connectivity probe");
        return Ok(false);
    }

    let client = build_http_client(proxy, timeout)?;
    let response = client
        .get(probe_url)
        .send()
        .await
        .map_err(TransportError::Probe)?;

    let status = response.status();
    if status.is_success() {
        info!("Proxy probe to {} succeeded ({})", probe_url, status);
        Ok(true)
    } else {
        warn!("Proxy probe to {} returned {}", probe_url, status);
        Err(TransportError::ProbeStatus(status.as_u16()))
    }
}
