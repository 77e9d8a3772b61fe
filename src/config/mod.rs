mod config;
mod secret;

pub(crate) use config::{AssetConfig, EnforcementConfig, ProxyConfig, UpstreamProtocol, UpstreamTarget};
pub(crate) use secret::SigningSecret;

#[cfg(test)]
pub(crate) use secret::Secret;
