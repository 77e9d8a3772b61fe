use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::{Context, Error, Result};
use axum::http::HeaderName;
use serde::Deserialize;

use super::secret::{Secret, SigningSecret};

const fn _default_proxy_port() -> u16 { 8002 }
const fn _default_metrics_port() -> u16 { 8003 }
const fn _default_listen_address() -> IpAddr { IpAddr::V4(Ipv4Addr::LOCALHOST) }
const fn _default_upstream_timeout_secs() -> u64 { 30 }
const fn _default_connect_timeout_secs() -> u64 { 10 }
const fn _default_true() -> bool { true }
fn _default_api_key_param() -> String { "api_key".to_string() }
fn _default_asset_path_prefix() -> String { "/apod/image/".to_string() }
fn _default_token_header() -> String { "Approov-Token".to_string() }
fn _default_binding_header() -> String { "Authorization".to_string() }

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct ProxyConfig {
    #[serde(default = "_default_proxy_port")]
    pub(crate) proxy_port: u16,
    #[serde(default = "_default_metrics_port")]
    pub(crate) metrics_port: u16,
    #[serde(default = "_default_listen_address")]
    pub(crate) listen_address: IpAddr,
    #[serde(default = "_default_upstream_timeout_secs")]
    pub(crate) upstream_timeout_secs: u64,
    #[serde(default = "_default_connect_timeout_secs")]
    pub(crate) connect_timeout_secs: u64,
    pub(crate) upstream: UpstreamTarget,
    pub(crate) assets: AssetConfig,
    pub(crate) approov: ApproovConfig,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UpstreamProtocol {
    Http,
    #[default]
    Https,
}

impl fmt::Display for UpstreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamProtocol::Http => f.write_str("http"),
            UpstreamProtocol::Https => f.write_str("https"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct UpstreamTarget {
    pub(crate) host: String,
    #[serde(default)]
    pub(crate) protocol: UpstreamProtocol,
    #[serde(default = "_default_api_key_param")]
    pub(crate) api_key_param: String,
    pub(crate) api_key: Secret<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct AssetConfig {
    pub(crate) host: String,
    #[serde(default = "_default_asset_path_prefix")]
    pub(crate) path_prefix: String,
    #[serde(default = "_default_true")]
    pub(crate) enforce_approov: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct ApproovConfig {
    pub(crate) token_base64_secret: Secret<String>,
    #[serde(default = "_default_token_header")]
    pub(crate) token_header: String,
    #[serde(default = "_default_binding_header")]
    pub(crate) binding_header: String,
    #[serde(default = "_default_true")]
    pub(crate) abort_request_on_invalid_token: bool,
    #[serde(default = "_default_true")]
    pub(crate) check_token_binding: bool,
    #[serde(default = "_default_true")]
    pub(crate) abort_request_on_invalid_token_binding: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EnforcementConfig {
    pub(crate) require_token_on_failure: bool,
    pub(crate) check_binding: bool,
    pub(crate) require_binding_on_failure: bool,
}

impl ProxyConfig {
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        let config: ProxyConfig =
            toml::from_str(contents).context("Couldn't parse proxy configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.upstream.host.trim().is_empty(), "upstream.host must not be empty");
        anyhow::ensure!(!self.assets.host.trim().is_empty(), "assets.host must not be empty");
        anyhow::ensure!(
            !self.upstream.host.eq_ignore_ascii_case(&self.assets.host),
            "assets.host must differ from upstream.host"
        );
        anyhow::ensure!(
            !self.upstream.api_key.reveal().trim().is_empty(),
            "upstream.api_key must not be empty"
        );
        anyhow::ensure!(
            !self.upstream.api_key_param.is_empty(),
            "upstream.api_key_param must not be empty"
        );

        let prefix = &self.assets.path_prefix;
        if !(prefix.starts_with('/') && prefix.ends_with('/')) {
            return Err(Error::msg(format!(
                "assets.path_prefix \"{prefix}\" must start and end with '/'"
            )));
        }

        for header in [&self.approov.token_header, &self.approov.binding_header] {
            HeaderName::try_from(header.as_str())
                .with_context(|| format!("\"{header}\" is not a valid header name"))?;
        }

        self.approov.signing_secret()?;
        Ok(())
    }

    pub(crate) fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl ApproovConfig {
    pub(crate) fn signing_secret(&self) -> Result<SigningSecret> {
        SigningSecret::from_base64(self.token_base64_secret.reveal())
    }

    pub(crate) fn enforcement(&self) -> EnforcementConfig {
        EnforcementConfig {
            require_token_on_failure: self.abort_request_on_invalid_token,
            check_binding: self.check_token_binding,
            require_binding_on_failure: self.abort_request_on_invalid_token_binding,
        }
    }
}
