// Library API HTTP client.
// Resolves paths against the configured base URL and unwraps response envelopes.

use async_trait::async_trait;
use reqwest::{
    Client, Response, Url,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ShelfError};

use super::transport::{ApiRequest, Method, Transport};
use super::types::Envelope;

const CLIENT_USER_AGENT: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the library REST API.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `https://host/api/`).
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ShelfError::Network)?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL.
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ShelfError::Other(format!("Invalid request path {}: {}", path, e)))
    }

    /// Check response status and unwrap the envelope.
    async fn check_response(&self, response: Response) -> Result<Envelope<Value>> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error bodies are usually envelopes too; fall back to the reason phrase.
            let message = serde_json::from_str::<Envelope<Value>>(&body)
                .ok()
                .map(|envelope| envelope.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            return Err(ShelfError::api(Some(status.as_u16()), message));
        }

        let envelope: Envelope<Value> = serde_json::from_str(&body)?;
        envelope.ensure_success()
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send(&self, request: ApiRequest) -> Result<Envelope<Value>> {
        let url = self.url(&request.path)?;
        debug!(%request, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = if request.params.is_empty() {
            builder
        } else {
            builder.query(&request.params)
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await.map_err(ShelfError::Network)?;
        self.check_response(response).await
    }
}

/// Parse the base URL, making sure relative paths join beneath it.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized)
        .map_err(|e| ShelfError::Config(format!("invalid API base URL {:?}: {}", base_url, e)))
}
