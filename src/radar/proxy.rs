use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{mock_series, NetflowsResponse, RadarConfig, UpstreamClient};
use crate::error::UpstreamError;

pub const NO_KEY_MESSAGE: &str = "No API key configured - using enhanced mock data";
pub const ALL_FAILED_MESSAGE: &str = "API endpoints returned errors - using enhanced mock data";

/// Sequential fetch-with-fallback over the configured upstream endpoints.
///
/// No retries, no backoff, no caching: every call walks the chain again.
#[derive(Clone)]
pub struct RadarProxy {
    api_key: Option<String>,
    endpoints: Vec<String>,
    upstream: Arc<dyn UpstreamClient>,
}

impl RadarProxy {
    pub fn new(
        api_key: Option<String>,
        config: &RadarConfig,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoints: config.endpoints.clone(),
            upstream,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Never fails; errors are folded into a fallback body
    pub async fn netflows(&self) -> NetflowsResponse {
        info!(
            has_key = self.api_key.is_some(),
            key_len = self.api_key.as_ref().map(|k| k.len()).unwrap_or(0),
            "Radar proxy credential check"
        );

        let Some(api_key) = self.api_key.as_deref() else {
            return Self::fallback(NO_KEY_MESSAGE);
        };

        match self.first_success(api_key).await {
            Ok(Some((endpoint, data))) => {
                info!(endpoint = %endpoint, "Radar upstream succeeded");
                NetflowsResponse::success(data, endpoint)
            }
            Ok(None) => {
                warn!("All radar endpoints failed, returning mock data");
                Self::fallback(ALL_FAILED_MESSAGE)
            }
            Err(e) => {
                warn!(error = %e, "Radar proxy error");
                Self::fallback(format!("Server error: {e} - using enhanced mock data"))
            }
        }
    }

    /// Walk the chain. `Ok(None)` when every endpoint failed; `Err` only for
    /// failures that would hit every endpoint the same way.
    async fn first_success(
        &self,
        api_key: &str,
    ) -> Result<Option<(String, Value)>, UpstreamError> {
        for endpoint in &self.endpoints {
            debug!(endpoint = %endpoint, "Trying radar endpoint");

            match self.upstream.get_json(endpoint, api_key).await {
                Ok(data) => return Ok(Some((endpoint.clone(), data))),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Radar endpoint failed");
                }
            }
        }
        Ok(None)
    }

    fn fallback(message: impl Into<String>) -> NetflowsResponse {
        let mut rng = StdRng::from_entropy();
        NetflowsResponse::fallback(message, mock_series(&mut rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Replays a fixed outcome per endpoint and records the call order
    struct ScriptedUpstream {
        outcomes: Vec<Result<Value, UpstreamError>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedUpstream {
        fn new(outcomes: Vec<Result<Value, UpstreamError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl UpstreamClient for ScriptedUpstream {
        async fn get_json(&self, url: &str, _api_key: &str) -> Result<Value, UpstreamError> {
            let mut calls = self.calls.lock();
            let idx = calls.len();
            calls.push(url.to_string());
            self.outcomes[idx].clone()
        }
    }

    fn status(code: u16) -> Result<Value, UpstreamError> {
        Err(UpstreamError::Status {
            status: code,
            body: "nope".into(),
        })
    }

    #[tokio::test]
    async fn test_no_key_skips_upstream() {
        let upstream = ScriptedUpstream::new(vec![]);
        let proxy = RadarProxy::new(None, &RadarConfig::default(), upstream.clone());

        let resp = proxy.netflows().await;
        assert!(!resp.success);
        assert!(resp.is_fallback());
        assert_eq!(resp.message.as_deref(), Some(NO_KEY_MESSAGE));
        assert!(upstream.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let upstream = ScriptedUpstream::new(vec![]);
        let proxy = RadarProxy::new(Some("  ".into()), &RadarConfig::default(), upstream);
        assert!(!proxy.has_api_key());
    }

    #[tokio::test]
    async fn test_second_endpoint_wins_after_first_fails() {
        let upstream = ScriptedUpstream::new(vec![
            Err(UpstreamError::Transport("connection reset".into())),
            Ok(json!({"result": {"ok": true}})),
            Ok(json!({"never": "reached"})),
        ]);
        let config = RadarConfig::default();
        let proxy = RadarProxy::new(Some("key".into()), &config, upstream.clone());

        let resp = proxy.netflows().await;
        assert!(resp.success);
        assert_eq!(resp.endpoint.as_deref(), Some(config.endpoints[1].as_str()));
        assert_eq!(upstream.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_all_failed_message() {
        let upstream = ScriptedUpstream::new(vec![
            status(500),
            Err(UpstreamError::InvalidBody("eof".into())),
            status(403),
        ]);
        let proxy = RadarProxy::new(Some("key".into()), &RadarConfig::default(), upstream.clone());

        let resp = proxy.netflows().await;
        assert!(resp.is_fallback());
        assert_eq!(resp.message.as_deref(), Some(ALL_FAILED_MESSAGE));
        assert_eq!(upstream.calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_interpolates_message() {
        let upstream = ScriptedUpstream::new(vec![Err(UpstreamError::Client(
            "invalid API key header".into(),
        ))]);
        let proxy = RadarProxy::new(Some("key".into()), &RadarConfig::default(), upstream.clone());

        let resp = proxy.netflows().await;
        assert!(resp.is_fallback());
        assert_eq!(
            resp.message.as_deref(),
            Some("Server error: invalid API key header - using enhanced mock data")
        );
        assert_eq!(upstream.calls.lock().len(), 1);
    }
}
