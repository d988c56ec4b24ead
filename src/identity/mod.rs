//! The Identity Provider Facade: an object-safe abstraction over system
//! account and group lookups, backed locally by `nix::unistd` and mockable
//! in tests.

pub mod local;
pub mod record;

pub use local::LocalIdentityProvider;
pub use record::{GroupRecord, IdentityRecord, PasswordVerdict};

use nix::unistd::{Gid, Uid};

/// Facade over the system identity database (`getpwnam`/`getpwuid`,
/// `getgrnam`/`getgrgid`, group enumeration) and the credential-checking
/// primitives layered on top of it.
///
/// Kept object-safe (`dyn IdentityProvider`) so the Credential Verifier and
/// Session Gatekeeper can be driven by a mock in tests without a generic
/// parameter threaded through every call site.
#[cfg_attr(feature = "cluster-unit-tests", mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    /// Looks up an account by name.
    fn user_by_name(&self, name: &str) -> Option<IdentityRecord>;

    /// Looks up an account by uid.
    fn user_by_uid(&self, uid: Uid) -> Option<IdentityRecord>;

    /// Looks up a group by name.
    fn group_by_name(&self, name: &str) -> Option<GroupRecord>;

    /// Looks up a group by gid.
    fn group_by_gid(&self, gid: Gid) -> Option<GroupRecord>;

    /// Returns every group `user` belongs to, including the user's primary
    /// group, with no duplicate gids.
    fn groups_for_user(&self, user: &str) -> Vec<GroupRecord>;

    /// Returns whether `user` is a member of `group`, consulting both the
    /// user's primary group and supplementary memberships.
    fn is_member(&self, user: &str, group: &str) -> bool {
        self.groups_for_user(user)
            .iter()
            .any(|record| record.name == group)
    }

    /// Verifies `password` against the backend's stored credential for
    /// `user`. Returns [`PasswordVerdict::NoSuchUser`] if the account is
    /// unknown to the backend rather than to the configuration tree.
    fn authenticate(&self, user: &str, password: &secrecy::SecretString) -> PasswordVerdict;
}

/// Adapts an `&dyn IdentityProvider` to the Config Resolver's narrower
/// [`crate::config::resolver::GroupMembership`] dependency, so the
/// resolver's module stays free of a direct dependency on this facade.
pub struct AsGroupMembership<'a>(pub &'a dyn IdentityProvider);

impl crate::config::resolver::GroupMembership for AsGroupMembership<'_> {
    fn is_member(&self, user: &str, group: &str) -> bool {
        self.0.is_member(user, group)
    }
}
