//! Fixtures shared by this crate's unit and integration tests: building a
//! minimal [`ServerScope`] and wiring a mocked [`IdentityProvider`].

use camino::Utf8PathBuf;
use std::sync::Arc;

use crate::config::scope::{AnonymousScope, ServerScope};
use crate::runstate::RunStateRegistry;

/// Builds a server scope with an `<Anonymous ~ftp>` block bound to `root`,
/// an alias from `anon_user` to `ftp`, and `AnonRequirePassword off`, the
/// configuration shape end-to-end scenario 1 describes.
#[must_use]
pub fn anonymous_ftp_scope(anon_user: &str, root: impl Into<Utf8PathBuf>) -> ServerScope {
    let mut scope = ServerScope::new();
    let anon_index = scope.add_anonymous_block(AnonymousScope {
        owner: "ftp".to_owned(),
        root: root.into(),
        directives: {
            let mut table = crate::config::DirectiveTable::new();
            table.push("AnonRequirePassword", vec!["off".to_owned()]);
            table
        },
    });
    scope.add_alias(anon_user, "ftp", Some(anon_index));
    scope
}

/// Builds a bare server scope with only the given top-level directives set,
/// useful for limit/policy tests that do not need an anonymous block.
#[must_use]
pub fn scope_with_directives(pairs: &[(&str, &str)]) -> ServerScope {
    let mut scope = ServerScope::new();
    for (name, value) in pairs {
        scope.directives.push(name, vec![(*value).to_owned()]);
    }
    scope
}

/// Creates an in-memory-backed run-state registry rooted at a fresh
/// temporary file, for tests that exercise admission counting without
/// touching a shared path.
///
/// # Panics
///
/// Panics if a temporary file cannot be created; acceptable for test-only
/// scaffolding, which has no caller to propagate the error to.
#[must_use]
pub fn temp_registry() -> (Arc<RunStateRegistry>, tempfile::TempPath) {
    let file = tempfile::NamedTempFile::new().expect("create temp registry file");
    let path = file.into_temp_path();
    let utf8_path = Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf8 temp path");
    (RunStateRegistry::new(utf8_path), path)
}

#[cfg(feature = "cluster-unit-tests")]
pub mod mock_identity {
    //! Convenience constructors for [`crate::identity::MockIdentityProvider`].

    use secrecy::SecretString;

    use crate::identity::{GroupRecord, IdentityRecord, MockIdentityProvider, PasswordVerdict};

    /// Builds a mock provider with one account/group pair and a single
    /// registered password, sufficient for most credential-verifier tests.
    ///
    /// The account's uid is 0 when `user` is literally `"root"`, and 1000
    /// otherwise; use [`single_account_with_uid`] to exercise a
    /// differently-named uid-0 account (e.g. a `toor`-style rename).
    #[must_use]
    pub fn single_account(user: &str, password: &str) -> MockIdentityProvider {
        let uid = if user == "root" { 0 } else { 1000 };
        single_account_with_uid(user, password, uid)
    }

    /// Builds a mock provider like [`single_account`], with an explicit uid
    /// independent of the account name.
    #[must_use]
    pub fn single_account_with_uid(user: &str, password: &str, uid: u32) -> MockIdentityProvider {
        let user = user.to_owned();
        let password = password.to_owned();
        let mut mock = MockIdentityProvider::new();

        let record_user = user.clone();
        mock.expect_user_by_name().returning(move |name| {
            (name == record_user).then(|| IdentityRecord {
                name: record_user.clone(),
                uid: nix::unistd::Uid::from_raw(uid),
                gid: nix::unistd::Gid::from_raw(1000),
                home: Some(format!("/home/{name}").into()),
                shell: Some("/bin/sh".into()),
            })
        });

        mock.expect_groups_for_user().returning(|_| Vec::new());

        mock.expect_group_by_gid().returning(|gid| {
            Some(GroupRecord { name: format!("group{}", gid.as_raw()), gid })
        });

        mock.expect_authenticate().returning(move |name, cleartext: &SecretString| {
            use secrecy::ExposeSecret;
            if name != user {
                PasswordVerdict::NoSuchUser
            } else if cleartext.expose_secret() == password {
                PasswordVerdict::Ok
            } else {
                PasswordVerdict::BadPassword
            }
        });

        mock
    }
}
