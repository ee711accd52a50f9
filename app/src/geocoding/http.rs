//! Shared HTTP plumbing for the geocoding providers.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;

use crate::config::GeocodingConfig;
use super::{GeocodingError, GeocodingResult};

/// A `reqwest` client bound to one provider name for error reporting
#[derive(Clone)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    provider: &'static str,
}

impl HttpTransport {
    pub(crate) fn new(provider: &'static str, config: &GeocodingConfig) -> GeocodingResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|source| GeocodingError::Network { provider, source })?;

        Ok(Self { client, provider })
    }

    pub(crate) fn provider(&self) -> &'static str {
        self.provider
    }

    /// GET `url` with `query` and decode the JSON body
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> GeocodingResult<T> {
        let provider = self.provider;
        debug!("{} GET {} {:?}", provider, url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| GeocodingError::Network { provider, source })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(GeocodingError::Status { provider, status: status.as_u16() });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| GeocodingError::Network { provider, source })?;

        serde_json::from_slice(&body).map_err(|source| GeocodingError::Decode { provider, source })
    }
}

/// Join a base URL and a path without doubling the slash
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
