//! Runs a single Privilege Installer sequence in a throwaway process.
//!
//! Usage:
//!
//! ```text
//! ftpd_login_worker <config-path>
//! ```
//!
//! The JSON payload at `config-path` must serialize a [`WorkerPayload`]. The
//! worker performs the real chroot/group-install/`setresuid` sequence
//! against the live system, since that transition is irreversible; isolating
//! it in a dedicated process lets a calling test assert on the outcome
//! without giving up its own privileges. A representative payload is:
//!
//! ```json
//! {
//!   "original_user": "alice",
//!   "resolved_user": "alice",
//!   "peer_addr": "203.0.113.1:4021",
//!   "anon_root": null,
//!   "require_password": false,
//!   "userdir_root": false,
//!   "require_valid_shell": false,
//!   "use_ftp_users": false,
//!   "wtmp_log": false,
//!   "show_symlinks": true,
//!   "default_root": null,
//!   "default_chdir": null,
//!   "valid_shells_path": "/etc/shells",
//!   "denied_users_path": "/etc/ftpd-auth-core/ftpusers"
//! }
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ftpd_auth_core::config::resolver::EffectiveScope;
use ftpd_auth_core::context::AnonymousBinding;
use ftpd_auth_core::credential::{CredentialOutcome, Verdict};
use ftpd_auth_core::identity::LocalIdentityProvider;
use ftpd_auth_core::privilege::{install, InstallRequest, InstallerPaths, InstallerPolicy};
use ftpd_auth_core::session::{LoginAttempt, PromptPolicy};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while driving one installer run.
#[derive(Debug, Error)]
enum WorkerError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to read worker config: {0}")]
    ConfigRead(#[source] std::io::Error),
    #[error("failed to parse worker config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("installer failed: {0}")]
    Installer(String),
}

/// Serializable description of one installer run, standing in for the
/// verified [`LoginAttempt`]/[`CredentialOutcome`] pair a live gatekeeper
/// would hand the installer.
#[derive(Debug, Deserialize)]
struct WorkerPayload {
    original_user: String,
    resolved_user: String,
    peer_addr: String,
    anon_root: Option<Utf8PathBuf>,
    require_password: bool,
    userdir_root: bool,
    require_valid_shell: bool,
    use_ftp_users: bool,
    wtmp_log: bool,
    show_symlinks: bool,
    default_root: Option<Utf8PathBuf>,
    default_chdir: Option<Utf8PathBuf>,
    valid_shells_path: Utf8PathBuf,
    denied_users_path: Utf8PathBuf,
}

/// The subset of [`ftpd_auth_core::context::SessionContext`] worth reporting
/// back to the caller as JSON; `Uid`/`Gid` do not serialize directly.
#[derive(Debug, Serialize)]
struct WorkerResult {
    user: String,
    group: String,
    uid: u32,
    gid: u32,
    groups: Vec<String>,
    anon_root: Option<Utf8PathBuf>,
    is_anon: bool,
    cwd: Utf8PathBuf,
}

fn main() -> Result<(), BoxError> {
    run_worker(env::args_os()).map_err(Into::into)
}

fn run_worker(mut args: impl Iterator<Item = OsString>) -> Result<(), WorkerError> {
    let _program = args.next();
    let config_path = args.next().ok_or_else(|| WorkerError::InvalidArgs("missing config path argument".into()))?;
    if args.next().is_some() {
        return Err(WorkerError::InvalidArgs("unexpected extra argument".into()));
    }

    let config_bytes = fs::read(&config_path).map_err(WorkerError::ConfigRead)?;
    let payload: WorkerPayload = serde_json::from_slice(&config_bytes).map_err(WorkerError::ConfigParse)?;

    let result = run_installer(payload).map_err(|err| WorkerError::Installer(err.to_string()))?;
    let rendered = serde_json::to_string(&result).map_err(WorkerError::ConfigParse)?;
    tracing::info!(result = %rendered, "installer run complete");
    Ok(())
}

fn run_installer(payload: WorkerPayload) -> ftpd_auth_core::error::PrivilegeResult<WorkerResult> {
    let identity = LocalIdentityProvider::new();

    let anon_binding = payload.anon_root.map(|root| AnonymousBinding::Configured {
        anon_index: 0,
        root,
        require_password: payload.require_password,
        userdir_root: payload.userdir_root,
    });
    let scope = if anon_binding.is_some() { EffectiveScope::Anonymous(0) } else { EffectiveScope::Server };

    let attempt = LoginAttempt {
        original_user: payload.original_user,
        resolved_user: Some(payload.resolved_user),
        scope,
        anon_binding,
        anon_name: None,
        anon_group: None,
        prompt_policy: PromptPolicy::DeferToPass,
        attempt_count: 0,
        known_failure: false,
    };

    let credential = CredentialOutcome { verdict: Verdict::Ok, anon_binding: None, anon_group: None };

    let policy = InstallerPolicy {
        require_valid_shell: payload.require_valid_shell,
        use_ftp_users: payload.use_ftp_users,
        wtmp_log: payload.wtmp_log,
        show_symlinks: payload.show_symlinks,
        default_root: payload.default_root,
        default_chdir: payload.default_chdir,
    };

    let paths = InstallerPaths { valid_shells: payload.valid_shells_path, denied_users: payload.denied_users_path };

    let context = install(InstallRequest {
        attempt,
        credential,
        policy,
        paths,
        identity: &identity,
        peer_addr: &payload.peer_addr,
    })?;

    Ok(WorkerResult {
        user: context.user,
        group: context.group,
        uid: context.uid.as_raw(),
        gid: context.gid.as_raw(),
        groups: context.groups,
        anon_root: context.anon_root,
        is_anon: context.is_anon,
        cwd: context.cwd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_config_path() {
        let args = vec![OsString::from("ftpd_login_worker")];
        let err = run_worker(args.into_iter()).expect_err("missing path must fail");
        assert!(matches!(err, WorkerError::InvalidArgs(_)));
    }

    #[test]
    fn rejects_extra_argument() {
        let args = vec![
            OsString::from("ftpd_login_worker"),
            OsString::from("/tmp/config.json"),
            OsString::from("unexpected"),
        ];
        let err = run_worker(args.into_iter()).expect_err("extra argument must fail");
        assert!(matches!(err, WorkerError::InvalidArgs(_)));
    }
}
