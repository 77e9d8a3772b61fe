use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProxyError {
    #[error("upstream request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("client request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("upstream response from {url} exceeds {limit} bytes")]
    UpstreamResponseTooLarge { url: String, limit: usize },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::Transport { .. } | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UpstreamResponseTooLarge { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::Transport { url, source } => {
                tracing::error!(%url, error = %source, timeout = source.is_timeout(), "Internal Server Error: upstream transport failure");
            }
            ProxyError::PayloadTooLarge { limit } => {
                tracing::warn!(limit, "Payload Too Large: client request body rejected");
            }
            ProxyError::UpstreamResponseTooLarge { url, limit } => {
                tracing::error!(%url, limit, "Bad Gateway: upstream response body too large");
            }
            ProxyError::Internal(error) => {
                tracing::error!(error = %error, "Internal Server Error");
            }
        }
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, Json(json!({ "error": reason }))).into_response()
    }
}
