//! The Privilege Installer: the ordered sequence from shell/denied-user
//! checks through chroot, group install, UID/GID drop, and chdir that turns
//! a verified [`LoginAttempt`](crate::session::LoginAttempt) into a
//! [`SessionContext`].
//!
//! Any failure from step 7 onward (see module-level step numbering in the
//! method bodies) is session-fatal: the caller must hard-exit the worker
//! rather than attempt recovery, since the filesystem view may already be
//! restricted.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{eyre, Context};
use nix::unistd::{Gid, Uid, getresgid, getresuid, setresgid, setresuid};

use crate::context::{AnonymousBinding, SessionContext, SessionFlags};
use crate::credential::CredentialOutcome;
use crate::error::{PrivilegeError, PrivilegeResult};
use crate::identity::{GroupRecord, IdentityProvider, IdentityRecord};
use crate::observability::{audit_event, AuditSeverity};
use crate::session::LoginAttempt;

use super::checks::{shell_is_valid, user_is_denied};
use super::groups::install_group_list;
use super::guard::{chroot_into, with_signals_blocked, PrivilegeBracket};
use super::paths::{adjust_cwd_after_chroot, canonicalize, compute_anon_root};

/// Filesystem dependencies the installer consults; out-of-scope content
/// (the files themselves) but in-scope paths.
#[derive(Debug, Clone)]
pub struct InstallerPaths {
    /// Path to the valid-shells file, consulted when `RequireValidShell` is set.
    pub valid_shells: Utf8PathBuf,
    /// Path to the denied-users file, consulted when `UseFtpUsers` is set.
    pub denied_users: Utf8PathBuf,
}

/// Policy flags collected from the resolved configuration scope, ahead of
/// invoking the installer.
#[derive(Debug, Clone, Default)]
pub struct InstallerPolicy {
    /// Whether the identity's shell must appear in the valid-shells file.
    pub require_valid_shell: bool,
    /// Whether the identity must not appear in the denied-users file.
    pub use_ftp_users: bool,
    /// Whether login records should be written (wtmp-style); carried
    /// through to the returned context rather than acted on here, since
    /// writing the log is an out-of-scope collaborator.
    pub wtmp_log: bool,
    /// Whether symlinks are shown in directory listings post-login.
    pub show_symlinks: bool,
    /// `DefaultRoot` for non-anon logins matching the login's groups, if any.
    pub default_root: Option<Utf8PathBuf>,
    /// `DefaultChdir` for logins matching the login's groups, if any.
    pub default_chdir: Option<Utf8PathBuf>,
}

/// Inputs to a single [`install`] call.
pub struct InstallRequest<'a> {
    /// The verified login attempt.
    pub attempt: LoginAttempt,
    /// The credential verifier's outcome.
    pub credential: CredentialOutcome,
    /// Policy flags resolved ahead of time by the caller.
    pub policy: InstallerPolicy,
    /// Filesystem dependency paths.
    pub paths: InstallerPaths,
    /// Identity provider, for the final group/password record lookups.
    pub identity: &'a dyn IdentityProvider,
    /// Peer address, for audit logging.
    pub peer_addr: &'a str,
}

/// Runs the Privilege Installer sequence, returning a populated
/// [`SessionContext`] on success.
///
/// # Errors
///
/// Returns a [`PrivilegeError`] for any step's failure. Callers must treat
/// every error returned from step 7 onward as session-fatal: hard-exit the
/// worker instead of retrying or rolling back.
pub fn install(request: InstallRequest<'_>) -> PrivilegeResult<SessionContext> {
    let InstallRequest { attempt, credential, policy, paths, identity, peer_addr } = request;

    let resolved_user = attempt
        .resolved_user
        .clone()
        .ok_or_else(|| PrivilegeError::from(eyre!("installer invoked without a resolved user")))?;

    let identity_record = identity
        .user_by_name(&resolved_user)
        .ok_or_else(|| PrivilegeError::from(eyre!("no identity record for {resolved_user}")))?;

    // Step 1: valid-shell check.
    if policy.require_valid_shell {
        let shell = identity_record.shell.as_deref().map_or("", Utf8Path::as_str);
        if !shell_is_valid(&paths.valid_shells, shell)? {
            return Err(policy_rejection(&resolved_user, peer_addr, "shell not in valid-shells file"));
        }
    }

    // Step 2: denied-users check.
    if policy.use_ftp_users && user_is_denied(&paths.denied_users, &resolved_user)? {
        return Err(policy_rejection(&resolved_user, peer_addr, "user listed in denied-users file"));
    }

    let anon_binding = credential.anon_binding.clone().or_else(|| attempt.anon_binding.clone());
    let is_anon = anon_binding.is_some();

    // Step 3: compute the final anon root.
    let anon_root = anon_binding
        .as_ref()
        .map(|binding| {
            let username = if binding.userdir_root() { Some(resolved_user.as_str()) } else { None };
            compute_anon_root(binding.declared_root(), binding.userdir_root(), username, attempt.anon_name.as_deref())
        })
        .transpose()?;

    // Step 4: anon-group override rewrites the primary gid/group.
    let (mut primary_gid, mut primary_group_name) = (identity_record.gid, primary_group_name(identity, &identity_record));
    if let Some(group_name) = &credential.anon_group {
        if let Some(record) = identity.group_by_name(group_name) {
            primary_gid = record.gid;
            primary_group_name = record.name;
        }
    }

    // Step 5 (access limits re-evaluation) and step 6 (deferred directory
    // blocks) are delegated to the out-of-scope directory-configuration and
    // command-dispatcher layers; nothing in this crate's data model changes
    // as a result, so there is no local action to take here.

    let supplementary = identity.groups_for_user(&resolved_user);

    // Step 7: P, install the supplementary group list, R.
    {
        let _bracket = PrivilegeBracket::elevate()?;
        let gids: Vec<Gid> = supplementary.iter().map(|record: &GroupRecord| record.gid).collect();
        install_group_list(primary_gid, &gids)?;
    }

    let mut cwd = identity_record.home.clone().unwrap_or_else(|| Utf8PathBuf::from("/"));

    // Step 8: non-anon DefaultRoot chroot.
    if !is_anon {
        if let Some(default_root) = &policy.default_root {
            let canonical_root = canonicalize(default_root)?;
            {
                let _bracket = PrivilegeBracket::elevate()?;
                chroot_into(&canonical_root)?;
            }
            cwd = adjust_cwd_after_chroot(&cwd, &canonical_root);
        }
    }

    // Step 9: anon chroot.
    let mut final_root = None;
    if is_anon {
        let root = anon_root
            .clone()
            .ok_or_else(|| PrivilegeError::from(eyre!("anonymous login missing a computed root")))?;
        {
            let _bracket = PrivilegeBracket::elevate()?;
            chroot_into(&root).map_err(|err| {
                audit_event!(AuditSeverity::Error, resolved_user, peer_addr, "chroot to anonymous root failed");
                err
            })?;
            let gids: Vec<Gid> = supplementary.iter().map(|record: &GroupRecord| record.gid).collect();
            install_group_list(primary_gid, &gids)?;
        }
        cwd = Utf8PathBuf::from("/");
        final_root = Some(root);
    }

    if let Some(chdir_target) = &policy.default_chdir {
        cwd = chdir_target.clone();
    }

    // Step 10: block signals; drop real+effective UID/GID.
    with_signals_blocked(|| drop_to_final_identity(identity_record.uid, primary_gid))?;

    // Step 11: canonicalize and chdir.
    let canonical_cwd = canonicalize(&cwd).unwrap_or_else(|_| Utf8PathBuf::from("/"));
    std::env::set_current_dir(canonical_cwd.as_std_path())
        .with_context(|| format!("chdir {}", canonical_cwd.as_str()))
        .map_err(PrivilegeError::from)?;

    // Step 12 (dynamic per-directory overlay) is built by the out-of-scope
    // directory-configuration layer once the chrooted view is live.

    // Step 13: populate the SessionContext.
    let groups: Vec<String> = supplementary.iter().map(|record| record.name.clone()).collect();
    let gids: Vec<Gid> = supplementary.iter().map(|record| record.gid).collect();

    audit_event!(AuditSeverity::Notice, resolved_user, peer_addr, "login installed");

    Ok(SessionContext {
        user: resolved_user.clone(),
        group: primary_group_name,
        uid: identity_record.uid,
        gid: primary_gid,
        gids,
        groups,
        anon_root: final_root,
        is_anon,
        cwd: canonical_cwd.clone(),
        vwd: canonical_cwd,
        flags: SessionFlags {
            is_anon,
            ascii_mode: true,
            hide_password: true,
        },
        proc_prefix: resolved_user,
    })
}

fn primary_group_name(identity: &dyn IdentityProvider, record: &IdentityRecord) -> String {
    identity
        .group_by_gid(record.gid)
        .map_or_else(|| record.gid.as_raw().to_string(), |group| group.name)
}

fn policy_rejection(user: &str, peer_addr: &str, reason: &str) -> PrivilegeError {
    audit_event!(AuditSeverity::Notice, user, peer_addr, reason);
    PrivilegeError::from(eyre!("policy rejection: {reason}"))
}

/// Performs the real-and-effective UID/GID transition (not merely the
/// effective one), verifying the result before returning.
fn drop_to_final_identity(uid: Uid, gid: Gid) -> PrivilegeResult<()> {
    setresgid(gid, gid, gid).with_context(|| "setresgid failed").map_err(PrivilegeError::from)?;
    setresuid(uid, uid, uid).with_context(|| "setresuid failed").map_err(PrivilegeError::from)?;

    let actual_uid = getresuid().with_context(|| "getresuid failed").map_err(PrivilegeError::from)?;
    let actual_gid = getresgid().with_context(|| "getresgid failed").map_err(PrivilegeError::from)?;

    if actual_uid.effective != uid || actual_gid.effective != gid {
        return Err(PrivilegeError::from(eyre!("post-transition identity mismatch")));
    }

    Ok(())
}
