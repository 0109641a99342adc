/// HTTP client seam used by the network-backed fetchers
///
/// Fetchers only see the [`HttpClient`] trait and the [`HttpResponse`] it
/// resolves to. [`ReqwestHttpClient`] is the production implementation.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Request headers as plain name/value pairs
pub type Headers = HashMap<String, String>;

/// A fully buffered HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| anyhow::anyhow!("Failed to decode response body (status {}): {}", self.status, e))
    }
}

/// Minimal HTTP surface the marketplace needs
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
    async fn post(&self, url: &str, body: &Value, headers: &Headers) -> Result<HttpResponse>;
}

/// `Content-Type: application/json`, sent with every JSON POST
pub fn json_headers() -> Headers {
    HashMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

/// reqwest-backed HTTP client
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client })
    }

    async fn finish(response: reqwest::Response, method: &str, url: &str) -> Result<HttpResponse> {
        let status = response.status();
        tracing::debug!("📡 {} {} -> {}", method, url, status);

        let body = response
            .text()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;

        Ok(HttpResponse::new(status.as_u16(), body))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!("🌍 HTTP Request: GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("HTTP request failed: {}", e))?;
        Self::finish(response, "GET", url).await
    }

    async fn post(&self, url: &str, body: &Value, headers: &Headers) -> Result<HttpResponse> {
        tracing::debug!("🌍 HTTP Request: POST {}", url);
        tracing::debug!("📋 Headers: {:?}", headers);

        let mut request_builder = self.client.post(url).json(body);
        for (key, value) in headers {
            request_builder = request_builder.header(key.as_str(), value.as_str());
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("HTTP request failed: {}", e))?;
        Self::finish(response, "POST", url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_covers_the_2xx_range_only() {
        assert!(HttpResponse::new(200, "").ok());
        assert!(HttpResponse::new(204, "").ok());
        assert!(!HttpResponse::new(304, "").ok());
        assert!(!HttpResponse::new(500, "").ok());
    }

    #[test]
    fn json_decodes_body_and_reports_failures() {
        let response = HttpResponse::new(200, r#"{"nodes": []}"#);
        let body: Value = response.json().unwrap();
        assert_eq!(body, json!({"nodes": []}));

        let broken = HttpResponse::new(502, "<html>");
        let err = broken.json::<Value>().unwrap_err();
        assert!(err.to_string().contains("status 502"));
    }

    #[test]
    fn json_headers_sets_content_type() {
        assert_eq!(
            json_headers().get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }
}
