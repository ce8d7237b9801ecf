//! Authenticated calls to the remote API

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

/// Header some APIs use to gate on client version
const CLIENT_VERSION_HEADER: &str = "X-Client-Version";

/// Raw response; the caller decides what a failure status means
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Thin POST-JSON client that carries the token as a bearer credential
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    client_version: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, client_version: Option<String>) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base URL {}", base_url))?;
        // Without a trailing slash `join` would replace the last path segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            client_version,
        })
    }

    #[cfg(test)]
    fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Resolve `endpoint` (e.g. "v2/get-documents") against the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .with_context(|| format!("invalid endpoint {}", endpoint))
    }

    /// POST `body` to `endpoint`; the token is used for this request only
    pub async fn post(
        &self,
        token: &str,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {}", url);

        let mut request = self.http.post(url.clone()).bearer_auth(token).json(body);
        if let Some(version) = &self.client_version {
            request = request.header(CLIENT_VERSION_HEADER, version);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read response body")?;

        debug!("{} returned {} ({} bytes)", url, status, body.len());
        Ok(ApiResponse { status, body })
    }
}
