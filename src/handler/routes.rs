use axum::{
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::middleware as handler_middleware;
use super::state::ProxyState;
use super::{assets, proxy};

pub(crate) type RouteProvider = fn(Router<ProxyState>, &ProxyState) -> Router<ProxyState>;

pub(crate) const ROUTE_PROVIDERS: &[RouteProvider] = &[root_routes, proxy::routes, assets::routes];

pub(crate) fn router(state: ProxyState) -> Router {
    ROUTE_PROVIDERS
        .iter()
        .fold(Router::new(), |router, register| register(router, &state))
        .fallback(not_found)
        .layer(middleware::from_fn(handler_middleware::metrics))
        .with_state(state)
}

fn root_routes(router: Router<ProxyState>, _state: &ProxyState) -> Router<ProxyState> {
    router.route("/", get(root))
}

async fn root() -> impl IntoResponse {
    tracing::info!("ENDPOINT: /");
    Json(json!({ "name": "Approov Reverse Proxy" }))
}

pub(crate) async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::warn!(%uri, "Not Found: unhandled api endpoint");
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}
