use std::fmt;

use anyhow::{Context, Result};
use base64::prelude::*;
use serde::Deserialize;

/// Configuration value that must never reach a log line.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub(crate) struct Secret<T>
where
    T: Clone + Default,
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { value }
    }

    pub(crate) fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[derive(Clone)]
pub(crate) struct SigningSecret(Secret<Vec<u8>>);

impl SigningSecret {
    pub(crate) fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .context("Approov token secret is not valid base64")?;
        anyhow::ensure!(!bytes.is_empty(), "Approov token secret decodes to zero bytes");
        Ok(Self(Secret::new(bytes)))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.reveal()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("super-secret-api-key".to_string());
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "super-secret-api-key");
    }

    #[test]
    fn signing_secret_decodes_base64() -> Result<()> {
        let secret = SigningSecret::from_base64("c2VjcmV0")?;
        assert_eq!(secret.as_bytes(), b"secret");
        assert_eq!(format!("{secret:?}"), "SigningSecret(****)");
        Ok(())
    }

    #[test]
    fn signing_secret_rejects_garbage() {
        assert!(SigningSecret::from_base64("not base64 at all!").is_err());
        assert!(SigningSecret::from_base64("").is_err());
    }
}
