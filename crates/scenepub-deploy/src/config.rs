//! Deployment configuration.
//!
//! Custom `Debug` implementation redacts the private key so that it never
//! reaches log output. The key string is held in `Zeroizing` memory.

use scenepub_content_client::ContentServerConfig;
use scenepub_crypto::LocalSigner;
use scenepub_linker::LinkerConfig;
use zeroize::Zeroizing;

/// Largest file accepted by default (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default viewer used to build the report link.
pub const DEFAULT_VIEWER_URL: &str = "https://play.decentraland.org";

/// Configuration for a deployment.
#[derive(Clone)]
pub struct DeployConfig {
    /// Hex private key. `Some` bypasses the signing handshake.
    pub private_key: Option<Zeroizing<String>>,
    /// Files larger than this many bytes abort the deployment.
    pub max_file_size: u64,
    /// Viewer base URL for the report link.
    pub viewer_url: String,
    /// Content server target and discovery.
    pub content: ContentServerConfig,
    /// Signing handshake settings.
    pub linker: LinkerConfig,
}

impl std::fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployConfig")
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("max_file_size", &self.max_file_size)
            .field("viewer_url", &self.viewer_url)
            .field("content", &self.content)
            .field("linker", &self.linker)
            .finish()
    }
}

impl DeployConfig {
    /// Defaults around the given content server configuration, no private key.
    pub fn new(content: ContentServerConfig) -> Self {
        Self {
            private_key: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            viewer_url: DEFAULT_VIEWER_URL.to_string(),
            content,
            linker: LinkerConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DCL_PRIVATE_KEY` (optional; 64 hex chars, or 66 with `0x`)
    /// - `SCENEPUB_MAX_FILE_SIZE` in bytes (default: 50 MiB)
    /// - `SCENEPUB_VIEWER_URL` (default: [`DEFAULT_VIEWER_URL`])
    ///
    /// plus the content server and linker variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(
            |var| std::env::var(var).ok(),
            ContentServerConfig::from_env()?,
            LinkerConfig::from_env(),
        )
    }

    pub(crate) fn from_lookup<F>(
        lookup: F,
        content: ContentServerConfig,
        linker: LinkerConfig,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let private_key = match lookup("DCL_PRIVATE_KEY") {
            Some(raw) if !raw.trim().is_empty() => Some(validate_private_key(&raw)?),
            _ => None,
        };
        let max_file_size = match lookup("SCENEPUB_MAX_FILE_SIZE") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "SCENEPUB_MAX_FILE_SIZE".to_string(),
                value: raw,
            })?,
            None => DEFAULT_MAX_FILE_SIZE,
        };
        Ok(Self {
            private_key,
            max_file_size,
            viewer_url: lookup("SCENEPUB_VIEWER_URL").unwrap_or_else(|| DEFAULT_VIEWER_URL.to_string()),
            content,
            linker,
        })
    }

    /// Set the private key, validating its format.
    pub fn with_private_key(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.private_key = Some(validate_private_key(raw)?);
        Ok(self)
    }

    /// Signer for the configured key, if any.
    pub fn signer(&self) -> Result<Option<LocalSigner>, ConfigError> {
        self.private_key
            .as_ref()
            .map(|key| {
                LocalSigner::from_hex(key).map_err(|e| ConfigError::InvalidPrivateKey(e.to_string()))
            })
            .transpose()
    }
}

/// Check that `raw` is 64 hex characters, optionally prefixed with `0x`.
///
/// The error never echoes the key.
pub fn validate_private_key(raw: &str) -> Result<Zeroizing<String>, ConfigError> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.len() != 64 {
        return Err(ConfigError::InvalidPrivateKey(format!(
            "expected 64 hex characters (66 with 0x), got {}",
            trimmed.len()
        )));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidPrivateKey(
            "key contains non-hex characters".to_string(),
        ));
    }
    Ok(Zeroizing::new(hex.to_ascii_lowercase()))
}

/// Configuration errors. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `DCL_PRIVATE_KEY` has the wrong length or is not hex.
    #[error("invalid DCL_PRIVATE_KEY: {0}")]
    InvalidPrivateKey(String),

    /// A numeric variable did not parse.
    #[error("invalid value {value:?} for {var}")]
    InvalidNumber {
        /// Variable name.
        var: String,
        /// Value as found.
        value: String,
    },

    /// Content server configuration failed.
    #[error(transparent)]
    Content(#[from] scenepub_content_client::config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn load(vars: &[(&str, &str)]) -> Result<DeployConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeployConfig::from_lookup(
            |var| vars.get(var).cloned(),
            ContentServerConfig::local_mock("http://127.0.0.1:9000").unwrap(),
            LinkerConfig::default(),
        )
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = load(&[]).unwrap();
        assert!(cfg.private_key.is_none());
        assert_eq!(cfg.max_file_size, 50 * 1024 * 1024);
        assert_eq!(cfg.viewer_url, DEFAULT_VIEWER_URL);
        assert!(cfg.signer().unwrap().is_none());
    }

    #[test]
    fn key_with_and_without_prefix() {
        let plain = load(&[("DCL_PRIVATE_KEY", KEY)]).unwrap();
        let prefixed = load(&[("DCL_PRIVATE_KEY", &format!("0x{KEY}"))]).unwrap();
        let upper = load(&[("DCL_PRIVATE_KEY", &format!("0X{KEY}"))]).unwrap();
        let a = plain.signer().unwrap().unwrap().address();
        let b = prefixed.signer().unwrap().unwrap().address();
        let c = upper.signer().unwrap().unwrap().address();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.to_string(), "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23");
    }

    #[test]
    fn empty_key_means_absent() {
        assert!(load(&[("DCL_PRIVATE_KEY", "  ")]).unwrap().private_key.is_none());
    }

    #[test]
    fn malformed_keys_are_fatal() {
        for bad in [&KEY[..63], &format!("{KEY}00")[..], &format!("zz{}", &KEY[2..])[..]] {
            let err = load(&[("DCL_PRIVATE_KEY", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPrivateKey(_)), "accepted {bad}");
            assert!(!err.to_string().contains(bad));
        }
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = load(&[("DCL_PRIVATE_KEY", KEY)]).unwrap();
        let debug = format!("{cfg:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(KEY));
    }

    #[test]
    fn max_file_size_override() {
        let cfg = load(&[("SCENEPUB_MAX_FILE_SIZE", "1024")]).unwrap();
        assert_eq!(cfg.max_file_size, 1024);
        assert!(matches!(
            load(&[("SCENEPUB_MAX_FILE_SIZE", "lots")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
