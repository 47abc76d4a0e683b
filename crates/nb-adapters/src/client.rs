use anyhow::{Context, Result};
use nb_core::error::{ProviderError, ProviderResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Upstream error bodies are cut to this many bytes before logging.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderClientConfig {
    pub base_url: String,
    pub credential: Option<String>,
    pub timeout: Duration,
}

impl ProviderClientConfig {
    pub fn new(base_url: impl Into<String>, credential: Option<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            credential,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// How a provider expects its credential to be presented.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Auth {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Token <token>`
    Token,
    /// Credential sent as a query parameter with this name.
    Query(&'static str),
}

/// JSON-over-HTTPS client shared by the provider adapters.
pub(crate) struct JsonClient {
    provider: &'static str,
    http: Client,
    base_url: String,
    credential: Option<String>,
    auth: Auth,
}

impl JsonClient {
    pub(crate) fn new(
        provider: &'static str,
        config: &ProviderClientConfig,
        auth: Auth,
        extra_headers: HeaderMap,
    ) -> Result<Self> {
        let mut headers = extra_headers;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .with_context(|| format!("failed to build {provider} HTTP client"))?;

        Ok(Self {
            provider,
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential: config.credential.clone().filter(|c| !c.is_empty()),
            auth,
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let req = self.http.get(self.url(path)).query(query);
        self.send(req, path).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ProviderResult<T> {
        let req = self.http.post(self.url(path)).json(body);
        self.send(req, path).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> ProviderResult<RequestBuilder> {
        let credential = self
            .credential
            .as_deref()
            .ok_or(ProviderError::NotConfigured(self.provider))?;

        Ok(match self.auth {
            Auth::Bearer => req.header(AUTHORIZATION, format!("Bearer {credential}")),
            Auth::Token => req.header(AUTHORIZATION, format!("Token {credential}")),
            Auth::Query(name) => req.query(&[(name, credential)]),
        })
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> ProviderResult<T> {
        let req = self.authorize(req)?;
        let start = Instant::now();

        let response = req
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_utf8(&mut body, MAX_ERROR_BODY);
            warn!(provider = self.provider, path, status = %status, "provider returned error status");
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        debug!(
            provider = self.provider,
            path,
            status = %status,
            duration_ms = start.elapsed().as_millis() as u64,
            "provider request completed"
        );

        serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
