//! Coverage for the Credential Verifier: the anonymous shortcut, the primary
//! check against both inline and backend credentials, the group-password
//! fallback, and root-login enforcement.

#![cfg(feature = "cluster-unit-tests")]

use ftpd_auth_core::config::ServerScope;
use ftpd_auth_core::context::AnonymousBinding;
use ftpd_auth_core::credential::{verify, Attempt, Verdict};
use ftpd_auth_core::test_support::mock_identity::{single_account, single_account_with_uid};
use rstest::rstest;
use secrecy::SecretString;

fn base_attempt<'a>(original_user: &'a str, resolved_user: &'a str) -> Attempt<'a> {
    Attempt {
        original_user,
        resolved_user,
        anon_binding: None,
        anon_index: None,
        root_login_allowed: false,
        peer_addr: "203.0.113.7:4021",
    }
}

#[rstest]
fn anonymous_binding_without_password_requirement_always_succeeds() {
    let config = ServerScope::new();
    let provider = single_account("ftp", "irrelevant");
    let mut attempt = base_attempt("anonymous", "ftp");
    attempt.anon_binding = Some(AnonymousBinding::Configured {
        anon_index: 0,
        root: "/srv/ftp".into(),
        require_password: false,
        userdir_root: false,
    });

    let outcome = verify(&attempt, SecretString::from("anything at all".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::Ok);
}

#[rstest]
fn primary_check_falls_back_to_provider_authenticate() {
    let config = ServerScope::new();
    let provider = single_account("alice", "correct horse");
    let attempt = base_attempt("alice", "alice");

    let ok = verify(&attempt, SecretString::from("correct horse".to_owned()), &config, &provider);
    assert_eq!(ok.verdict, Verdict::Ok);

    let bad = verify(&attempt, SecretString::from("wrong".to_owned()), &config, &provider);
    assert_eq!(bad.verdict, Verdict::BadPassword);
}

#[rstest]
fn inline_user_password_is_checked_before_the_backend() {
    let mut config = ServerScope::new();
    let hash = ftpd_auth_core::identity::local::salted_sha256(&SecretString::from("s3cr3t".to_owned()), "saltvalue");
    config.add_user_password("alice", &hash, None);
    let provider = single_account("alice", "some-other-password");
    let attempt = base_attempt("alice", "alice");

    let outcome = verify(&attempt, SecretString::from("s3cr3t".to_owned()), &config, &provider);
    assert_eq!(outcome.verdict, Verdict::Ok);
}

#[rstest]
fn group_password_promotes_anon_group_when_not_anon_scoped() {
    let mut config = ServerScope::new();
    let hash = ftpd_auth_core::identity::local::salted_sha256(&SecretString::from("groupsecret".to_owned()), "pepper");
    config.add_group_password("uploaders", &hash, None);

    let mut provider = ftpd_auth_core::identity::MockIdentityProvider::new();
    provider.expect_user_by_name().returning(|_| None);
    provider
        .expect_authenticate()
        .returning(|_user, _password| ftpd_auth_core::identity::PasswordVerdict::NoSuchUser);
    provider.expect_groups_for_user().returning(|_| {
        vec![ftpd_auth_core::identity::GroupRecord {
            name: "uploaders".to_owned(),
            gid: nix::unistd::Gid::from_raw(2000),
        }]
    });

    let attempt = base_attempt("alice", "alice");
    let outcome = verify(&attempt, SecretString::from("groupsecret".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::Ok);
    assert_eq!(outcome.anon_group.as_deref(), Some("uploaders"));
}

#[rstest]
fn root_login_refused_by_default_even_with_correct_password() {
    let config = ServerScope::new();
    let provider = single_account("root", "toor");
    let mut attempt = base_attempt("root", "root");
    attempt.root_login_allowed = false;

    let outcome = verify(&attempt, SecretString::from("toor".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::BadPassword);
}

#[rstest]
fn root_login_permitted_when_explicitly_allowed() {
    let config = ServerScope::new();
    let provider = single_account("root", "toor");
    let mut attempt = base_attempt("root", "root");
    attempt.root_login_allowed = true;

    let outcome = verify(&attempt, SecretString::from("toor".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::Ok);
}

#[rstest]
fn root_login_gate_follows_uid_not_the_account_name() {
    let config = ServerScope::new();
    // A `UserAlias toor root`-style rename: the account is not literally
    // named "root" but carries uid 0, so the gate must still apply.
    let provider = single_account_with_uid("toor", "toor-password", 0);
    let mut attempt = base_attempt("toor", "toor");
    attempt.root_login_allowed = false;

    let outcome = verify(&attempt, SecretString::from("toor-password".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::BadPassword);
}

#[rstest]
fn an_account_merely_named_root_with_a_nonzero_uid_is_not_gated() {
    let config = ServerScope::new();
    let provider = single_account_with_uid("root", "ordinary-password", 1000);
    let mut attempt = base_attempt("root", "root");
    attempt.root_login_allowed = false;

    let outcome = verify(&attempt, SecretString::from("ordinary-password".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::Ok);
}

#[rstest]
fn unknown_account_is_reported_as_no_such_user() {
    let config = ServerScope::new();
    let provider = single_account("alice", "whatever");
    let attempt = base_attempt("mallory", "mallory");

    let outcome = verify(&attempt, SecretString::from("whatever".to_owned()), &config, &provider);

    assert_eq!(outcome.verdict, Verdict::NoSuchUser);
}
