//! Linker configuration.
//!
//! Defaults bind an ephemeral loopback port and wait ten minutes for the
//! signer. Override via environment variables or explicit construction.

use std::path::PathBuf;
use std::time::Duration;

/// Port used when the configured or ephemeral port cannot be bound.
pub const DEFAULT_PORT: u16 = 4044;

/// Configuration for a signing session.
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Port to bind on 127.0.0.1. `None` picks an ephemeral port.
    pub port: Option<u16>,
    /// Port tried when the first bind fails.
    pub fallback_port: u16,
    /// How long to wait for the signer before timing out.
    pub timeout: Duration,
    /// How long in-flight requests may take to finish at teardown.
    pub shutdown_grace: Duration,
    /// Directory with a custom signing UI. `None` serves the built-in page.
    pub ui_dir: Option<PathBuf>,
    /// Network name shown to the signer (e.g. `mainnet`).
    pub network: String,
    /// Whether Ctrl-C cancels the session.
    pub cancel_on_ctrl_c: bool,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            port: None,
            fallback_port: DEFAULT_PORT,
            timeout: Duration::from_secs(600),
            shutdown_grace: Duration::from_secs(1),
            ui_dir: None,
            network: "mainnet".to_string(),
            cancel_on_ctrl_c: true,
        }
    }
}

impl LinkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SCENEPUB_LINKER_PORT` (default: ephemeral)
    /// - `SCENEPUB_LINKER_TIMEOUT_SECS` (default: 600)
    /// - `SCENEPUB_LINKER_UI_DIR` (default: built-in page)
    /// - `SCENEPUB_NETWORK` (default: `mainnet`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("SCENEPUB_LINKER_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            timeout: std::env::var("SCENEPUB_LINKER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ui_dir: std::env::var_os("SCENEPUB_LINKER_UI_DIR").map(PathBuf::from),
            network: std::env::var("SCENEPUB_NETWORK").unwrap_or(defaults.network),
            ..Self::default()
        }
    }

    /// A configuration suitable for tests: ephemeral port, short timeout,
    /// no signal handling.
    pub fn for_tests(timeout: Duration) -> Self {
        Self {
            timeout,
            shutdown_grace: Duration::from_millis(200),
            cancel_on_ctrl_c: false,
            ..Self::default()
        }
    }
}
