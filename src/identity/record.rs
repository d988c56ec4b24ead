//! Data returned by the [`super::IdentityProvider`] facade.

use camino::Utf8PathBuf;
use nix::unistd::{Gid, Uid};

/// A resolved system account, as returned by `getpwnam`/`getpwuid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// The account name.
    pub name: String,
    /// The account's uid.
    pub uid: Uid,
    /// The account's primary gid.
    pub gid: Gid,
    /// The account's home directory, if the backend reports one.
    pub home: Option<Utf8PathBuf>,
    /// The account's login shell, if the backend reports one.
    pub shell: Option<Utf8PathBuf>,
}

/// A resolved system group, as returned by `getgrnam`/`getgrgid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    /// The group name.
    pub name: String,
    /// The group's gid.
    pub gid: Gid,
}

/// The result of verifying a password against a backend credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerdict {
    /// The password matched the stored credential.
    Ok,
    /// The backend has no account by this name.
    NoSuchUser,
    /// The account exists but the password did not match.
    BadPassword,
    /// The account exists but its credential has expired.
    Expired,
    /// The account exists but is administratively disabled.
    Disabled,
}

impl PasswordVerdict {
    /// Returns whether the verdict represents a successful verification.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}
