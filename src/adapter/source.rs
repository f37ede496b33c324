use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::AdapterError;
use crate::radar::{NetflowsResponse, RadarProxy};

/// Where the adapter gets its radar payload from
#[async_trait]
pub trait NetflowSource: Send + Sync {
    async fn fetch(&self) -> Result<NetflowsResponse, AdapterError>;
}

/// Polls the proxy route over HTTP
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    url: String,
}

impl ProxyClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NetflowSource for ProxyClient {
    async fn fetch(&self) -> Result<NetflowsResponse, AdapterError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AdapterError::TransportFailure(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::TransportFailure(e.to_string()))?;

        if !status.is_success() {
            return Err(AdapterError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AdapterError::MalformedResponse(e.to_string()))
    }
}

/// In-process source, skipping the HTTP hop
#[async_trait]
impl NetflowSource for RadarProxy {
    async fn fetch(&self) -> Result<NetflowsResponse, AdapterError> {
        Ok(self.netflows().await)
    }
}
