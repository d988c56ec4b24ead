//! Environment-driven configuration for the core's own small tunables.
//!
//! This is distinct from the out-of-scope directive-tree parser: the
//! directive tree configures per-login policy (aliases, anon blocks,
//! limits), while [`CoreSettings`] configures the core's own runtime paths
//! and defaults, its own installation rather than anything about the
//! login traffic it gates.
#![allow(non_snake_case)]

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Runtime tunables for the authentication core, resolved from environment
/// variables under the `FTPD_AUTH_` prefix.
#[derive(Debug, Clone, Serialize, Deserialize, OrthoConfig, Default)]
#[ortho_config(prefix = "FTPD_AUTH")]
pub struct CoreSettings {
    /// Path to the run-state registry file.
    pub run_state_path: Option<std::path::PathBuf>,
    /// Path to the valid-shells file.
    pub valid_shells_path: Option<std::path::PathBuf>,
    /// Path to the denied-users file.
    pub denied_users_path: Option<std::path::PathBuf>,
    /// Default `TimeoutLogin` in seconds, used when no directive overrides it.
    pub default_login_timeout_secs: Option<u64>,
    /// Default `MaxLoginAttempts`, used when no directive overrides it.
    pub default_max_login_attempts: Option<u32>,
}

impl CoreSettings {
    /// Path to the run-state registry, falling back to a conventional
    /// location under `/var/run`.
    #[must_use]
    pub fn run_state_path(&self) -> std::path::PathBuf {
        self.run_state_path
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("/var/run/ftpd-auth-core/run-state.json"))
    }

    /// Path to the valid-shells file, falling back to `/etc/shells`.
    #[must_use]
    pub fn valid_shells_path(&self) -> std::path::PathBuf {
        self.valid_shells_path.clone().unwrap_or_else(|| std::path::PathBuf::from("/etc/shells"))
    }

    /// Path to the denied-users file, falling back to a conventional
    /// location under `/etc`.
    #[must_use]
    pub fn denied_users_path(&self) -> std::path::PathBuf {
        self.denied_users_path
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("/etc/ftpd-auth-core/ftpusers"))
    }

    /// Default login timeout, falling back to 300 seconds.
    #[must_use]
    pub const fn default_login_timeout_secs(&self) -> u64 {
        match self.default_login_timeout_secs {
            Some(secs) => secs,
            None => 300,
        }
    }

    /// Default maximum login attempts, falling back to 3.
    #[must_use]
    pub const fn default_max_login_attempts(&self) -> u32 {
        match self.default_max_login_attempts {
            Some(n) => n,
            None => 3,
        }
    }
}
