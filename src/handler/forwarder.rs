use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    http::{header, request, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::instrument;

use super::errors::ProxyError;
use super::upstream;
use crate::config::UpstreamTarget;
use crate::metrics::consts as crate_metrics;

pub(crate) struct UpstreamRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    redacted_url: String,
}

impl UpstreamRequest {
    pub(crate) fn new(
        client_request: &request::Parts,
        body: Bytes,
        target: &UpstreamTarget,
        upstream_path: &str,
    ) -> anyhow::Result<Self> {
        let url = upstream::upstream_url(
            target.protocol,
            &target.host,
            upstream_path,
            client_request.uri.query(),
        )?;
        let url = upstream::with_query_param(url, &target.api_key_param, target.api_key.reveal());
        let redacted_url = upstream::redacted_url(&url, &target.api_key_param);

        Ok(UpstreamRequest {
            method: client_request.method.clone(),
            url,
            headers: upstream::forwardable_headers(&client_request.headers),
            body,
            redacted_url,
        })
    }

    pub(crate) fn redacted_url(&self) -> &str {
        &self.redacted_url
    }
}

#[derive(Debug)]
pub(crate) struct ProxyResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl ProxyResponse {
    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.body = body;
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Issues `request` once. Any upstream status is a success here; only transport failures are errors.
#[instrument(skip_all, err, level = tracing::Level::DEBUG)]
pub(crate) async fn forward(
    http_client: &reqwest::Client,
    request: UpstreamRequest,
    timeout: Duration,
) -> Result<ProxyResponse, ProxyError> {
    tracing::info!(upstream_url = request.redacted_url(), method = %request.method, "Forwarding request upstream");
    tracing::debug!(headers = ?request.headers);

    let UpstreamRequest {
        method,
        url,
        headers,
        body,
        redacted_url,
    } = request;

    let transport_error = |source: reqwest::Error| {
        metrics::counter!(crate_metrics::UPSTREAM_TRANSPORT_FAILURE).increment(1);
        ProxyError::Transport {
            url: redacted_url.clone(),
            source,
        }
    };

    let reqwest_start = Instant::now();
    let mut server_response = http_client
        .request(method.clone(), url)
        .headers(headers)
        .body(body)
        .timeout(timeout)
        .send()
        .await
        .map_err(transport_error)?;

    let status = server_response.status();
    let headers = upstream::relayable_headers(server_response.headers());
    let too_large = || ProxyError::UpstreamResponseTooLarge {
        url: redacted_url.clone(),
        limit: upstream::RESPONSE_SIZE_BYTES_UPPERBOUND,
    };
    if server_response
        .content_length()
        .is_some_and(|length| length > upstream::RESPONSE_SIZE_BYTES_UPPERBOUND as u64)
    {
        return Err(too_large());
    }

    // Chunked responses carry no length up front, so the bound is enforced while collecting.
    let mut body = Vec::new();
    while let Some(chunk) = server_response.chunk().await.map_err(transport_error)? {
        if body.len() + chunk.len() > upstream::RESPONSE_SIZE_BYTES_UPPERBOUND {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    let body = Bytes::from(body);

    metrics::histogram!(crate_metrics::UPSTREAM_REQUEST_DURATION_SECS)
        .record(reqwest_start.elapsed().as_secs_f64());

    tracing::info!(
        %status,
        %method,
        upstream_url = %redacted_url,
        body_bytes = body.len(),
    );

    Ok(ProxyResponse {
        status,
        headers,
        body,
    })
}
