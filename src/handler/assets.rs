use anyhow::Context;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tracing::instrument;

use super::enforcement;
use super::errors::ProxyError;
use super::routes;
use super::state::ProxyState;
use super::upstream;
use super::uuid;

pub(crate) fn routes(router: Router<ProxyState>, state: &ProxyState) -> Router<ProxyState> {
    let assets = &state.config.assets;
    let path = format!(
        "/{{version}}/{host}{prefix}{{*path}}",
        host = assets.host,
        prefix = assets.path_prefix
    );

    let route = get(asset);
    let route = match assets.enforce_approov {
        true => route.layer(middleware::from_fn_with_state(state.clone(), enforcement::approov)),
        false => route,
    };
    // Other methods are unknown endpoints, not 405s.
    router.route(&path, route.fallback(routes::not_found))
}

#[instrument(skip_all, err, level = tracing::Level::DEBUG, fields(request_id=uuid()))]
pub(crate) async fn asset(
    State(state): State<ProxyState>,
    client_request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = client_request.into_parts();
    let assets = &state.config.assets;

    let mount = upstream::split_mount(parts.uri.path(), &assets.host)
        .context("Asset request path is not mounted under the asset host")?;
    let asset_url = upstream::upstream_url(
        state.config.upstream.protocol,
        &assets.host,
        mount.upstream_path,
        parts.uri.query(),
    )?;

    tracing::info!(%asset_url, method = %parts.method, "Streaming asset from upstream");

    let mut upstream_request = state
        .http_client
        .request(parts.method.clone(), asset_url.clone())
        .headers(upstream::forwardable_headers(&parts.headers));
    if parts.headers.contains_key(header::CONTENT_LENGTH)
        || parts.headers.contains_key(header::TRANSFER_ENCODING)
    {
        upstream_request = upstream_request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let server_response = upstream_request.send().await.map_err(|source| {
        metrics::counter!(crate::metrics::consts::UPSTREAM_TRANSPORT_FAILURE).increment(1);
        ProxyError::Transport {
            url: asset_url.to_string(),
            source,
        }
    })?;

    let status = server_response.status();
    let headers = upstream::relayable_headers(server_response.headers());
    tracing::info!(%status, %asset_url);

    // Dropping the client body drops this stream, which closes the upstream connection.
    let mut response = Response::new(Body::from_stream(server_response.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
