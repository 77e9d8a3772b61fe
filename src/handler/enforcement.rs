use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::json;
use tracing::instrument;

use super::approov_token::{ApproovClaims, TokenError};
use super::state::ProxyState;
use super::token_binding::{validate_binding, BindingOutcome};
use crate::config::EnforcementConfig;
use crate::metrics::consts::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Admit,
    Reject(StatusCode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Admission {
    pub(crate) token_valid: bool,
    pub(crate) binding: Option<BindingOutcome>,
    pub(crate) decision: Decision,
}

pub(crate) fn evaluate(
    token: &Result<ApproovClaims, TokenError>,
    bound_header_value: Option<&[u8]>,
    config: &EnforcementConfig,
) -> Admission {
    let claims = match token {
        Ok(claims) => claims,
        Err(error) => {
            let decision = match config.require_token_on_failure {
                true => Decision::Reject(error.status()),
                false => Decision::Admit,
            };
            return Admission {
                token_valid: false,
                binding: None,
                decision,
            };
        }
    };

    let binding = validate_binding(claims, bound_header_value, config);
    let decision = match binding.rejection_status() {
        Some(status) if config.require_binding_on_failure => Decision::Reject(status),
        _ => Decision::Admit,
    };

    Admission {
        token_valid: true,
        binding: Some(binding),
        decision,
    }
}

#[instrument(skip_all, level = tracing::Level::DEBUG)]
pub(crate) async fn approov(
    State(state): State<ProxyState>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let approov_config = &state.config.approov;

    let token_header = request
        .headers()
        .get(approov_config.token_header.as_str())
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let token = state.verifier.verify(token_header.as_deref());

    let bound_header_value = request
        .headers()
        .get(approov_config.binding_header.as_str())
        .map(|value| value.as_bytes());
    let admission = evaluate(&token, bound_header_value, &state.enforcement);

    log_admission(&method, &path, &token, &admission);
    count_admission(&token, &admission);

    match admission.decision {
        Decision::Reject(status) => (status, Json(json!({}))).into_response(),
        Decision::Admit => {
            request.extensions_mut().insert(admission);
            next.run(request).await
        }
    }
}

fn count_admission(token: &Result<ApproovClaims, TokenError>, admission: &Admission) {
    if let Decision::Reject(_) = admission.decision {
        counter!(APPROOV_REQUEST_REJECTED, "reason" => rejection_reason(token, admission)).increment(1);
        return;
    }

    let soft_failed = !admission.token_valid
        || admission
            .binding
            .is_some_and(|binding| binding.rejection_status().is_some());
    match soft_failed {
        true => counter!(APPROOV_REQUEST_SOFT_FAILED).increment(1),
        false => counter!(APPROOV_REQUEST_ADMITTED).increment(1),
    }
}

fn rejection_reason(token: &Result<ApproovClaims, TokenError>, admission: &Admission) -> &'static str {
    match (token, admission.binding) {
        (Err(TokenError::Missing), _) => "token_missing",
        (Err(TokenError::Invalid(_)), _) => "token_invalid",
        (Ok(_), Some(binding)) => binding.reason(),
        (Ok(_), None) => "unknown",
    }
}

fn log_admission(
    method: &Method,
    path: &str,
    token: &Result<ApproovClaims, TokenError>,
    admission: &Admission,
) {
    let status = match admission.decision {
        Decision::Reject(status) => status,
        Decision::Admit => StatusCode::OK,
    };
    let status = status.as_u16();

    match token {
        Ok(claims) => {
            tracing::debug!(
                status, %method, path,
                expires_at = ?claims.expires_at(),
                issued_at = ?claims.iat,
                device_id = ?claims.did,
                client_ip = ?claims.ip,
            );
            tracing::info!(status, %method, path, "ACCEPTED REQUEST WITH VALID APPROOV TOKEN");
        }
        Err(error) => {
            tracing::error!(status, %method, path, %error, "APPROOV TOKEN");
            match admission.decision {
                Decision::Reject(_) => {
                    tracing::error!(status, %method, path, "REJECTED REQUEST WITH INVALID APPROOV TOKEN")
                }
                Decision::Admit => {
                    tracing::warn!(status, %method, path, "ACCEPTED REQUEST WITH INVALID APPROOV TOKEN")
                }
            }
            return;
        }
    }

    match admission.binding {
        Some(BindingOutcome::Passed) => {
            tracing::info!(status, %method, path, "ACCEPTED REQUEST WITH VALID APPROOV TOKEN BINDING")
        }
        Some(BindingOutcome::SkippedNoClaim) => {
            tracing::warn!(status, %method, path, "APPROOV TOKEN BINDING WARNING: key 'pay' is missing.");
            tracing::info!(status, %method, path, "ACCEPTED REQUEST WITH APPROOV TOKEN BINDING MISSING");
        }
        Some(BindingOutcome::SkippedByConfig) | None => {}
        Some(outcome) => {
            tracing::warn!(status, %method, path, reason = outcome.reason(), "APPROOV TOKEN BINDING WARNING");
            match admission.decision {
                Decision::Reject(_) => tracing::error!(
                    status, %method, path,
                    "REJECTED REQUEST WITH INVALID APPROOV TOKEN BINDING"
                ),
                Decision::Admit => tracing::warn!(
                    status, %method, path,
                    "ACCEPTED REQUEST WITH INVALID APPROOV TOKEN BINDING"
                ),
            }
        }
    }
}
