use std::sync::Arc;

use anyhow::Result;

use super::approov_token::TokenVerifier;
use crate::config::{EnforcementConfig, ProxyConfig, UpstreamProtocol};

#[derive(Clone)]
pub(crate) struct ProxyState {
    pub(crate) config: Arc<ProxyConfig>,
    pub(crate) enforcement: EnforcementConfig,
    pub(crate) verifier: Arc<TokenVerifier>,
    pub(crate) http_client: reqwest::Client,
}

impl ProxyState {
    pub(crate) fn new(config: ProxyConfig) -> Result<Self> {
        let verifier = TokenVerifier::new(&config.approov.signing_secret()?);
        Ok(ProxyState {
            enforcement: config.approov.enforcement(),
            verifier: Arc::new(verifier),
            http_client: http_client(&config)?,
            config: Arc::new(config),
        })
    }
}

fn http_client(config: &ProxyConfig) -> Result<reqwest::Client> {
    // No client-wide timeout; the general route sets one per request.
    let http_client = reqwest::Client::builder()
        .https_only(config.upstream.protocol == UpstreamProtocol::Https)
        .connect_timeout(config.connect_timeout())
        .build()?;
    Ok(http_client)
}
