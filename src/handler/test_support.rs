use std::io;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use base64::prelude::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use super::token_binding::binding_hash;
use crate::config::ProxyConfig;

pub(crate) const SECRET_BASE64: &str = "c2VjcmV0";

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn mint_token(claims: &Value) -> Result<String> {
    let secret = BASE64_STANDARD.decode(SECRET_BASE64)?;
    mint_token_with(&Header::new(Algorithm::HS256), &secret, claims)
}

pub(crate) fn mint_token_with(header: &Header, secret: &[u8], claims: &Value) -> Result<String> {
    Ok(jsonwebtoken::encode(header, claims, &EncodingKey::from_secret(secret))?)
}

pub(crate) fn bound_token(header_value: &str) -> Result<String> {
    mint_token(&json!({
        "exp": now() + 300,
        "iat": now(),
        "pay": binding_hash(header_value.as_bytes()),
    }))
}

/// `extra_approov` lines are appended to the `[approov]` table.
pub(crate) fn test_config(upstream_host: &str, asset_host: &str, extra_approov: &str) -> Result<ProxyConfig> {
    ProxyConfig::from_toml(&format!(
        r#"
        upstream_timeout_secs = 5

        [upstream]
        host = "{upstream_host}"
        protocol = "http"
        api_key = "NASA_KEY"

        [assets]
        host = "{asset_host}"

        [approov]
        token_base64_secret = "{SECRET_BASE64}"
        {extra_approov}
        "#
    ))
}

pub(crate) fn closed_port_address() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?;
    drop(listener);
    Ok(address.to_string())
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) struct CapturedLogs {
    buffer: LogBuffer,
    _guard: tracing::subscriber::DefaultGuard,
}

impl CapturedLogs {
    pub(crate) fn start() -> Self {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        CapturedLogs {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub(crate) fn contents(&self) -> String {
        let bytes = self.buffer.0.lock().map(|bytes| bytes.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
