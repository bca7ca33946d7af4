//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/tiletoggle/config.json`.
//! A missing or unreadable file is not an error for the binary: it falls back
//! to the compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "window_manager": "i3",
//!   "store_path": "/run/user/1000/tiletoggle.db",
//!   "launch": { "attempts": 8, "interval_ms": 500 },
//!   "padding_monitor": "focused"
//! }
//! ```

use crate::wm::{bspwm, i3, LaunchPolicy, WmKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; `{}` is a valid file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which window manager to drive.
    pub window_manager: WmKind,

    /// SQLite database holding the toggle state.  Defaults to
    /// [`state::default_path`](crate::state::default_path).
    pub store_path: Option<PathBuf>,

    /// How long to wait for a started application's window.
    pub launch: LaunchConfig,

    /// bspwm monitor selector the `top_padding` option applies to.
    pub padding_monitor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_manager: WmKind::default(),
            store_path: None,
            launch: LaunchConfig::default(),
            padding_monitor: "focused".into(),
        }
    }
}

/// Window polling after an application launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Number of probes.  Unset means the window manager's own default
    /// (5 for bspwm, 10 for i3).
    pub attempts: Option<u32>,
    /// Pause between probes (ms).
    pub interval_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            attempts: None,
            interval_ms: 1000,
        }
    }
}

impl LaunchConfig {
    pub fn policy_for(&self, kind: WmKind) -> LaunchPolicy {
        let attempts = self.attempts.unwrap_or(match kind {
            WmKind::Bspwm => bspwm::DEFAULT_LAUNCH_ATTEMPTS,
            WmKind::I3 => i3::DEFAULT_LAUNCH_ATTEMPTS,
        });
        LaunchPolicy::new(attempts, Duration::from_millis(self.interval_ms))
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Where the state database lives.
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(crate::state::default_path)
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/tiletoggle`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("tiletoggle")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
