//! Error taxonomy
//!
//! None of these reach the renderer as hard failures: the adapter and the
//! radar proxy absorb them and substitute synthetic data. `ApiError` covers
//! request validation on the read-only API.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Why the adapter could not use real upstream data this cycle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// No credential configured. Expected; selects mock mode silently.
    #[error("no API key configured")]
    NoCredential,

    /// The proxy answered but every upstream endpoint failed
    #[error("API unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The local proxy returned a non-2xx status
    #[error("Server API error: {status} - {body}")]
    HttpStatus { status: u16, body: String },

    /// Network or body-read failure talking to the proxy
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Proxy answered with a body the adapter does not understand
    #[error("Unexpected server response format: {0}")]
    MalformedResponse(String),
}

impl AdapterError {
    /// Advisory string surfaced to the presentation layer, if any
    pub fn advisory(&self) -> Option<String> {
        match self {
            AdapterError::NoCredential => None,
            other => Some(other.to_string()),
        }
    }
}

/// Failure of a single upstream request made by the radar proxy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream body is not valid JSON: {0}")]
    InvalidBody(String),

    /// The request could not even be built. Aborts the whole endpoint chain.
    #[error("{0}")]
    Client(String),
}

impl UpstreamError {
    /// Only client-side construction failures stop the fallback chain
    pub fn is_fatal(&self) -> bool {
        matches!(self, UpstreamError::Client(_))
    }
}

/// Request-level errors on the JSON API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_credential_is_silent() {
        assert_eq!(AdapterError::NoCredential.advisory(), None);
    }

    #[test]
    fn test_advisories_are_human_readable() {
        let e = AdapterError::UpstreamUnavailable("all endpoints failed".into());
        assert_eq!(e.advisory().unwrap(), "API unavailable: all endpoints failed");

        let e = AdapterError::HttpStatus {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(e.advisory().unwrap(), "Server API error: 502 - bad gateway");
    }

    #[test]
    fn test_only_client_errors_are_fatal() {
        assert!(UpstreamError::Client("bad header".into()).is_fatal());
        assert!(!UpstreamError::Transport("timeout".into()).is_fatal());
        assert!(!UpstreamError::Status {
            status: 500,
            body: String::new()
        }
        .is_fatal());
    }

    #[test]
    fn test_api_error_status_codes() {
        let resp = ApiError::BadRequest("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = ApiError::NotFound("gone".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = ApiError::from(anyhow::anyhow!("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
