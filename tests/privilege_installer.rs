//! Coverage for the Privilege Installer's pure pre-transition checks:
//! shell/denied-users lookups, anon-root arithmetic, and post-chroot cwd
//! adjustment. None of these touch privileges, so they run unconditionally
//! in ordinary CI; the full [`ftpd_auth_core::privilege::install`] sequence
//! (which does require root) lives in its own privileged-only test binary.

#![cfg(feature = "cluster-unit-tests")]

use std::fs;

use camino::Utf8PathBuf;
use ftpd_auth_core::privilege::checks::{shell_is_valid, user_is_denied};
use ftpd_auth_core::privilege::paths::{adjust_cwd_after_chroot, compute_anon_root};
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
fn shell_is_valid_checks_the_configured_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("shells");
    fs::write(&path, "/bin/sh\n/bin/bash\n# a comment\n").expect("write shells file");
    let utf8 = Utf8PathBuf::from_path_buf(path).expect("utf8 path");

    assert!(shell_is_valid(&utf8, "/bin/bash").expect("check"));
    assert!(!shell_is_valid(&utf8, "/bin/zsh").expect("check"));
}

#[rstest]
fn shell_is_valid_treats_a_missing_file_as_no_valid_shells() {
    let missing = Utf8PathBuf::from("/nonexistent/path/to/shells");
    assert!(!shell_is_valid(&missing, "/bin/bash").expect("check"));
}

#[rstest]
fn user_is_denied_checks_the_configured_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ftpusers");
    fs::write(&path, "root\ndaemon\n").expect("write denied-users file");
    let utf8 = Utf8PathBuf::from_path_buf(path).expect("utf8 path");

    assert!(user_is_denied(&utf8, "root").expect("check"));
    assert!(!user_is_denied(&utf8, "alice").expect("check"));
}

#[rstest]
#[case("alice", None, true)]
#[case("ftp", Some("ftp"), false)]
#[case("", None, false)]
fn compute_anon_root_appends_username_unless_it_matches_the_owner(
    #[case] username: &str,
    #[case] owner_name: Option<&str>,
    #[case] expect_suffix: bool,
) {
    let dir = TempDir::new().expect("tempdir");
    let user_dir = dir.path().join(username);
    if !username.is_empty() {
        fs::create_dir_all(&user_dir).expect("create user subdirectory");
    }
    let declared = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");

    let username_arg = if username.is_empty() { None } else { Some(username) };
    let root = compute_anon_root(&declared, true, username_arg, owner_name).expect("compute anon root");

    if expect_suffix {
        assert!(root.as_str().ends_with(username));
    } else {
        assert_eq!(root, declared.canonicalize().unwrap_or(declared));
    }
}

#[rstest]
fn compute_anon_root_ignores_username_when_userdir_root_is_off() {
    let dir = TempDir::new().expect("tempdir");
    let declared = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");

    let root = compute_anon_root(&declared, false, Some("alice"), None).expect("compute anon root");

    assert!(!root.as_str().ends_with("alice"));
}

#[rstest]
fn adjust_cwd_after_chroot_strips_the_new_root_prefix() {
    let new_root = Utf8PathBuf::from("/srv/ftp");
    let adjusted = adjust_cwd_after_chroot(&Utf8PathBuf::from("/srv/ftp/pub"), &new_root);
    assert_eq!(adjusted, Utf8PathBuf::from("/pub"));
}

#[rstest]
fn adjust_cwd_after_chroot_resets_to_root_when_outside_the_new_root() {
    let new_root = Utf8PathBuf::from("/srv/ftp");
    let adjusted = adjust_cwd_after_chroot(&Utf8PathBuf::from("/home/alice"), &new_root);
    assert_eq!(adjusted, Utf8PathBuf::from("/"));
}
