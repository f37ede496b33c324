use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::UpstreamError;

/// One authenticated GET against an upstream analytics endpoint
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get_json(&self, url: &str, api_key: &str) -> Result<Value, UpstreamError>;
}

/// reqwest-backed upstream client
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("globe-latency/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn auth_headers(api_key: &str) -> Result<HeaderMap, UpstreamError> {
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|e| UpstreamError::Client(format!("invalid API key header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn get_json(&self, url: &str, api_key: &str) -> Result<Value, UpstreamError> {
        let headers = auth_headers(api_key)?;

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }
}
