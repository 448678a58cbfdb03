//! Content server client configuration.
//!
//! Without an explicit target the client asks the discovery endpoint for
//! candidate servers and picks the first healthy one. Override via
//! environment variables or explicit construction for staging/testing.

use url::Url;

/// Default discovery endpoint listing the catalyst content servers.
pub const DEFAULT_DISCOVERY_URL: &str = "https://peer.decentraland.org/lambdas/contracts/servers";

/// Configuration for reaching a content server.
#[derive(Debug, Clone)]
pub struct ContentServerConfig {
    /// Explicit server to deploy to. `None` uses discovery.
    pub target: Option<Url>,
    /// Endpoint returning `[{"baseUrl": …}]`.
    pub discovery_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ContentServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SCENEPUB_TARGET` (default: none, use discovery)
    /// - `SCENEPUB_DISCOVERY_URL` (default: [`DEFAULT_DISCOVERY_URL`])
    /// - `SCENEPUB_HTTP_TIMEOUT_SECS` (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let target = match std::env::var("SCENEPUB_TARGET") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_url("SCENEPUB_TARGET", &raw)?),
            _ => None,
        };
        Ok(Self {
            target,
            discovery_url: env_url("SCENEPUB_DISCOVERY_URL", DEFAULT_DISCOVERY_URL)?,
            timeout_secs: std::env::var("SCENEPUB_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        })
    }

    /// Replace the target with an explicit server URL.
    pub fn with_target(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.target = Some(parse_url("target", raw)?);
        Ok(self)
    }

    /// Configuration pointing at a local mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base` cannot be parsed.
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            target: Some(parse_url("local_mock", base)?),
            discovery_url: parse_url("local_mock", &format!("{base}/servers"))?,
            timeout_secs: 5,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(
            name.to_string(),
            format!("unsupported scheme \"{other}\""),
        )),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL could not be parsed or is not http(s).
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
