use super::enforcement::{self, Admission};
use super::errors::ProxyError;
use super::forwarder::{self, UpstreamRequest};
use super::rewrite::AssetRewrite;
use super::state::ProxyState;
use super::upstream;
use super::uuid;
use crate::metrics::consts as crate_metrics;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::time::Instant;
use tracing::instrument;

pub(crate) fn routes(router: Router<ProxyState>, state: &ProxyState) -> Router<ProxyState> {
    let host = &state.config.upstream.host;
    let route = any(proxy)
        .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(state.clone(), enforcement::approov))
        .layer(DefaultBodyLimit::max(upstream::REQUEST_SIZE_BYTES_UPPERBOUND));

    // `{*path}` never matches an empty tail, so the bare mount and its trailing slash are separate.
    router
        .route(&format!("/{{version}}/{host}"), route.clone())
        .route(&format!("/{{version}}/{host}/"), route.clone())
        .route(&format!("/{{version}}/{host}/{{*path}}"), route)
}

#[instrument(skip_all, err, level = tracing::Level::DEBUG, fields(request_id=uuid()))]
pub async fn proxy(
    State(state): State<ProxyState>,
    client_request_parts: request::Parts,
    client_request_body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let request_start = Instant::now();
    tracing::debug!(?client_request_parts);

    if let Some(admission) = client_request_parts.extensions.get::<Admission>() {
        tracing::debug!(?admission);
    }

    let mount = upstream::split_mount(
        client_request_parts.uri.path(),
        &state.config.upstream.host,
    )
    .context("Request path is not mounted under the upstream host")?;
    let public_base = upstream::public_base(
        &client_request_parts.headers,
        &client_request_parts.uri,
        mount.version,
    );

    let proxy_request_body_bytes = match client_request_body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ProxyError::PayloadTooLarge {
                limit: upstream::REQUEST_SIZE_BYTES_UPPERBOUND,
            });
        }
        Err(rejection) => {
            return Err(anyhow::Error::new(rejection)
                .context("Couldn't read client request body")
                .into());
        }
    };

    let upstream_request = UpstreamRequest::new(
        &client_request_parts,
        proxy_request_body_bytes,
        &state.config.upstream,
        mount.upstream_path,
    )?;

    let mut proxy_response = forwarder::forward(
        &state.http_client,
        upstream_request,
        state.config.upstream_timeout(),
    )
    .await?;

    let asset_rewrite =
        AssetRewrite::new(state.config.upstream.protocol, &state.config.assets, &public_base);
    let replaced = asset_rewrite.apply(&mut proxy_response);
    tracing::info!(replaced, %public_base, "Replaced asset URLs in the response body");
    metrics::counter!(crate_metrics::RESPONSE_URLS_REWRITTEN).increment(replaced as u64);

    tracing::debug!(elapsed = ?request_start.elapsed());

    Ok(proxy_response.into_response())
}
