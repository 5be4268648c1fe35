//! Remote backend: serves requests from an HTTP bucket.

use std::time::Duration;

use figma_archive_core::{Envelope, Headers};
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::Transport;
use super::codec::{is_gzip, parse_json};
use crate::error::{ClientError, ConfigError, TransportError};

/// Header carrying a personal access token.
pub const TOKEN_HEADER: &str = "X-Figma-Token";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by both buckets.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ClientError::HttpClient)
}

/// Fetches JSON payloads from one bucket base URL.
///
/// The upstream status and headers are passed through untouched. A body that
/// is not JSON (an XML error document, say) leaves `data` empty.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl RemoteBackend {
    pub fn new(http: reqwest::Client, base: &str, token: Option<String>) -> Result<Self, ClientError> {
        let base = Url::parse(base).map_err(|source| ConfigError::InvalidUrl {
            url: base.to_string(),
            source,
        })?;
        Ok(Self { http, base, token })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Transport for RemoteBackend {
    async fn get(&self, path: &str) -> Result<Envelope, TransportError> {
        let url = self.url_for(path);
        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let headers = convert_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        debug!(%url, status = status.as_u16(), len = body.len(), "remote fetch");

        Ok(Envelope {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data: decode_body(&url, status.is_success(), &body).await,
        })
    }

    fn base_url(&self) -> String {
        self.base.as_str().trim_end_matches('/').to_string()
    }
}

fn convert_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str(), value);
        }
    }
    headers
}

/// Buckets may hold gzip objects without advertising a content encoding, in
/// which case the transport hands the compressed bytes through as-is.
async fn decode_body(url: &str, success: bool, body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    match parse_json(body, is_gzip(body)).await {
        Ok(value) => Some(value),
        Err(err) => {
            if success {
                warn!(%url, "response body is not JSON: {err}");
            }
            None
        }
    }
}
