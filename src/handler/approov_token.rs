use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::SigningSecret;

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ApproovClaims {
    pub(crate) exp: i64,
    pub(crate) iat: Option<i64>,
    pub(crate) pay: Option<String>,
    pub(crate) did: Option<String>,
    pub(crate) ip: Option<String>,
}

impl ApproovClaims {
    pub(crate) fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum TokenError {
    #[error("Approov token empty or missing in the header of the request")]
    Missing,
    #[error("Approov token failed verification: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

impl TokenError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            TokenError::Missing => StatusCode::BAD_REQUEST,
            TokenError::Invalid(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Clone)]
pub(crate) struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub(crate) fn new(secret: &SigningSecret) -> Self {
        // HS256 only. Anything else in the token header is rejected by the decoder.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        TokenVerifier {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub(crate) fn verify(&self, token: Option<&str>) -> Result<ApproovClaims, TokenError> {
        let token = match token {
            Some(token) if !token.trim().is_empty() => token,
            _ => return Err(TokenError::Missing),
        };
        let data = jsonwebtoken::decode::<ApproovClaims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}
