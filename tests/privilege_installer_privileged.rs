//! Exercises the full [`install`] sequence: group install, chroot, the
//! final `setresuid`/`setresgid` drop, and the post-transition chdir.
//! Dropping privilege back down is irreversible for the rest of this
//! process, so these tests only run when the test binary is itself started
//! as root; otherwise each skips with a diagnostic.

#![cfg(all(feature = "privileged-tests", feature = "cluster-unit-tests"))]

use std::fs;
use std::os::unix::fs::PermissionsExt;

use camino::Utf8PathBuf;
use ftpd_auth_core::config::resolver::EffectiveScope;
use ftpd_auth_core::context::AnonymousBinding;
use ftpd_auth_core::credential::{CredentialOutcome, Verdict};
use ftpd_auth_core::identity::{IdentityRecord, MockIdentityProvider};
use ftpd_auth_core::privilege::{install, InstallRequest, InstallerPaths, InstallerPolicy};
use ftpd_auth_core::session::{LoginAttempt, PromptPolicy};
use nix::unistd::geteuid;
use rstest::rstest;
use tempfile::TempDir;

fn base_attempt(resolved_user: &str) -> LoginAttempt {
    LoginAttempt {
        original_user: resolved_user.to_owned(),
        resolved_user: Some(resolved_user.to_owned()),
        scope: EffectiveScope::Server,
        anon_binding: None,
        anon_name: None,
        anon_group: None,
        prompt_policy: PromptPolicy::DeferToPass,
        attempt_count: 0,
        known_failure: false,
    }
}

fn ok_credential() -> CredentialOutcome {
    CredentialOutcome { verdict: Verdict::Ok, anon_binding: None, anon_group: None }
}

#[rstest]
fn install_drops_to_the_target_identity_and_chroots() {
    if !geteuid().is_root() {
        eprintln!("skipping privileged installer scenario: not running as root");
        return;
    }

    let sandbox = TempDir::new().expect("tempdir");
    fs::set_permissions(sandbox.path(), fs::Permissions::from_mode(0o755)).expect("chmod sandbox");
    let root_dir = sandbox.path().join("root");
    fs::create_dir_all(&root_dir).expect("create chroot root");
    let utf8_root = Utf8PathBuf::from_path_buf(root_dir).expect("utf8 path");

    let mut identity = MockIdentityProvider::new();
    identity.expect_user_by_name().returning(|_| {
        Some(IdentityRecord {
            name: "nobody".to_owned(),
            uid: nix::unistd::Uid::from_raw(65534),
            gid: nix::unistd::Gid::from_raw(65534),
            home: Some("/".into()),
            shell: Some("/usr/sbin/nologin".into()),
        })
    });
    identity.expect_groups_for_user().returning(|_| Vec::new());
    identity.expect_group_by_gid().returning(|gid| {
        Some(ftpd_auth_core::identity::GroupRecord { name: format!("group{}", gid.as_raw()), gid })
    });

    let request = InstallRequest {
        attempt: base_attempt("nobody"),
        credential: ok_credential(),
        policy: InstallerPolicy {
            require_valid_shell: false,
            use_ftp_users: false,
            wtmp_log: false,
            show_symlinks: true,
            default_root: Some(utf8_root.clone()),
            default_chdir: None,
        },
        paths: InstallerPaths {
            valid_shells: Utf8PathBuf::from("/etc/shells"),
            denied_users: Utf8PathBuf::from("/etc/ftpusers"),
        },
        identity: &identity,
        peer_addr: "203.0.113.99:4021",
    };

    let context = install(request).expect("install succeeds as root");

    assert_eq!(context.user, "nobody");
    assert!(!context.is_anon);
    assert_eq!(context.uid, nix::unistd::Uid::from_raw(65534));
}

/// Anonymous bindings carry their own chroot root independent of
/// `DefaultRoot`, and install must chroot into it rather than the
/// identity's home directory.
#[rstest]
fn install_chroots_into_the_anonymous_root_when_binding_is_present() {
    if !geteuid().is_root() {
        eprintln!("skipping privileged installer scenario: not running as root");
        return;
    }

    let sandbox = TempDir::new().expect("tempdir");
    fs::set_permissions(sandbox.path(), fs::Permissions::from_mode(0o755)).expect("chmod sandbox");
    let anon_root = sandbox.path().join("ftp");
    fs::create_dir_all(&anon_root).expect("create anon root");
    let utf8_root = Utf8PathBuf::from_path_buf(anon_root).expect("utf8 path");

    let mut identity = MockIdentityProvider::new();
    identity.expect_user_by_name().returning(|_| {
        Some(IdentityRecord {
            name: "ftp".to_owned(),
            uid: nix::unistd::Uid::from_raw(65534),
            gid: nix::unistd::Gid::from_raw(65534),
            home: Some("/home/ftp".into()),
            shell: Some("/usr/sbin/nologin".into()),
        })
    });
    identity.expect_groups_for_user().returning(|_| Vec::new());
    identity.expect_group_by_gid().returning(|gid| {
        Some(ftpd_auth_core::identity::GroupRecord { name: format!("group{}", gid.as_raw()), gid })
    });

    let mut attempt = base_attempt("ftp");
    attempt.anon_binding = Some(AnonymousBinding::Configured {
        anon_index: 0,
        root: utf8_root,
        require_password: false,
        userdir_root: false,
    });
    attempt.anon_name = Some("ftp".to_owned());

    let request = InstallRequest {
        attempt,
        credential: ok_credential(),
        policy: InstallerPolicy::default(),
        paths: InstallerPaths {
            valid_shells: Utf8PathBuf::from("/etc/shells"),
            denied_users: Utf8PathBuf::from("/etc/ftpusers"),
        },
        identity: &identity,
        peer_addr: "203.0.113.98:4021",
    };

    let context = install(request).expect("install succeeds as root");

    assert!(context.is_anon);
    assert_eq!(context.cwd, Utf8PathBuf::from("/"));
}
