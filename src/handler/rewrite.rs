use axum::body::Bytes;

use super::forwarder::ProxyResponse;
use crate::config::{AssetConfig, UpstreamProtocol};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssetRewrite {
    upstream_origin: String,
    proxy_base: String,
}

impl AssetRewrite {
    pub(crate) fn new(protocol: UpstreamProtocol, assets: &AssetConfig, public_base: &str) -> Self {
        AssetRewrite {
            upstream_origin: format!("{protocol}://{host}{prefix}", host = assets.host, prefix = assets.path_prefix),
            proxy_base: format!("{public_base}/{host}{prefix}", host = assets.host, prefix = assets.path_prefix),
        }
    }

    pub(crate) fn apply(&self, response: &mut ProxyResponse) -> usize {
        let body = std::mem::take(&mut response.body);
        let (body, replaced) = rewrite(body, &self.upstream_origin, &self.proxy_base);
        response.set_body(body);
        replaced
    }
}

/// Literal substring replacement, not URL or content-type aware. Non UTF-8 bodies are returned untouched.
pub(crate) fn rewrite(body: Bytes, upstream_origin: &str, proxy_base: &str) -> (Bytes, usize) {
    let Ok(text) = std::str::from_utf8(&body) else {
        return (body, 0);
    };
    let replaced = text.matches(upstream_origin).count();
    if replaced == 0 {
        return (body, 0);
    }
    (Bytes::from(text.replace(upstream_origin, proxy_base)), replaced)
}
