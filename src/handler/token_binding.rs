use axum::http::StatusCode;
use base64::prelude::*;
use sha2::{Digest, Sha256};

use super::approov_token::ApproovClaims;
use crate::config::EnforcementConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BindingOutcome {
    Passed,
    SkippedNoClaim,
    SkippedByConfig,
    EmptyClaim,
    MissingHeader,
    Mismatch,
}

impl BindingOutcome {
    pub(crate) fn rejection_status(self) -> Option<StatusCode> {
        match self {
            BindingOutcome::Passed
            | BindingOutcome::SkippedNoClaim
            | BindingOutcome::SkippedByConfig => None,
            BindingOutcome::EmptyClaim | BindingOutcome::MissingHeader => {
                Some(StatusCode::BAD_REQUEST)
            }
            BindingOutcome::Mismatch => Some(StatusCode::UNAUTHORIZED),
        }
    }

    pub(crate) fn reason(self) -> &'static str {
        match self {
            BindingOutcome::Passed => "binding_passed",
            BindingOutcome::SkippedNoClaim => "binding_claim_missing",
            BindingOutcome::SkippedByConfig => "binding_not_checked",
            BindingOutcome::EmptyClaim => "binding_claim_empty",
            BindingOutcome::MissingHeader => "binding_header_missing",
            BindingOutcome::Mismatch => "binding_mismatch",
        }
    }
}

pub(crate) fn validate_binding(
    claims: &ApproovClaims,
    bound_header_value: Option<&[u8]>,
    config: &EnforcementConfig,
) -> BindingOutcome {
    if !config.check_binding {
        return BindingOutcome::SkippedByConfig;
    }

    let Some(pay) = claims.pay.as_deref() else {
        return BindingOutcome::SkippedNoClaim;
    };
    if pay.trim().is_empty() {
        return BindingOutcome::EmptyClaim;
    }

    let bound_header_value = match bound_header_value {
        Some(value) if !value.trim_ascii().is_empty() => value,
        _ => return BindingOutcome::MissingHeader,
    };

    match binding_hash(bound_header_value) == pay {
        true => BindingOutcome::Passed,
        false => BindingOutcome::Mismatch,
    }
}

/// base64 of the SHA-256 of the raw header bytes, as embedded by the client in `pay`.
pub(crate) fn binding_hash(value: &[u8]) -> String {
    BASE64_STANDARD.encode(Sha256::digest(value))
}
