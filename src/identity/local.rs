//! System-backed [`IdentityProvider`] implementation.

use std::ffi::CString;

use camino::Utf8PathBuf;
use nix::unistd::{Gid, Group, Uid, User};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::record::{GroupRecord, IdentityRecord, PasswordVerdict};
use super::IdentityProvider;

/// [`IdentityProvider`] backed by the host's user and group databases via
/// `nix::unistd`, with password verification against a salted SHA-256
/// credential store supplied at construction.
///
/// The credential store is a stand-in for whatever backend holds real
/// account passwords (PAM, shadow, an external directory); this crate's
/// scope is the authentication state machine and privilege transition, not
/// the credential backend itself.
pub struct LocalIdentityProvider {
    credentials: std::collections::HashMap<String, String>,
}

impl LocalIdentityProvider {
    /// Creates a provider with no registered credentials; `authenticate`
    /// will report [`PasswordVerdict::NoSuchUser`] for every account until
    /// credentials are registered via [`Self::with_credential`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            credentials: std::collections::HashMap::new(),
        }
    }

    /// Registers a salted-hash credential for `user`, replacing any prior
    /// entry.
    #[must_use]
    pub fn with_credential(mut self, user: &str, salted_hash: &str) -> Self {
        self.credentials.insert(user.to_owned(), salted_hash.to_owned());
        self
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes `password` with `salt` using SHA-256, returning a hex digest.
///
/// This is the inline format used by `UserPassword`/`GroupPassword`
/// directives: `salt$hexdigest`, not a general-purpose password KDF. It is
/// deliberately fast, matching the reference's own inline hash scheme; a
/// slow KDF is out of scope for this crate's directive-compatible hashing.
#[must_use]
pub fn salted_sha256(password: &SecretString, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.expose_secret().as_bytes());
    let digest = hasher.finalize();
    format!("{salt}${}", hex::encode(digest))
}

/// Verifies `password` against a stored `salt$hexdigest` credential.
#[must_use]
pub fn verify_salted_sha256(password: &SecretString, stored: &str) -> bool {
    let Some((salt, _)) = stored.split_once('$') else {
        return false;
    };
    salted_sha256(password, salt) == stored
}

impl IdentityProvider for LocalIdentityProvider {
    fn user_by_name(&self, name: &str) -> Option<IdentityRecord> {
        User::from_name(name).ok().flatten().map(to_identity_record)
    }

    fn user_by_uid(&self, uid: Uid) -> Option<IdentityRecord> {
        User::from_uid(uid).ok().flatten().map(to_identity_record)
    }

    fn group_by_name(&self, name: &str) -> Option<GroupRecord> {
        Group::from_name(name).ok().flatten().map(to_group_record)
    }

    fn group_by_gid(&self, gid: Gid) -> Option<GroupRecord> {
        Group::from_gid(gid).ok().flatten().map(to_group_record)
    }

    fn groups_for_user(&self, user: &str) -> Vec<GroupRecord> {
        let Some(identity) = self.user_by_name(user) else {
            return Vec::new();
        };
        gid_list(user, identity.gid)
            .into_iter()
            .filter_map(|gid| self.group_by_gid(gid))
            .collect()
    }

    fn authenticate(&self, user: &str, password: &SecretString) -> PasswordVerdict {
        let Some(stored) = self.credentials.get(user) else {
            return PasswordVerdict::NoSuchUser;
        };
        if verify_salted_sha256(password, stored) {
            PasswordVerdict::Ok
        } else {
            PasswordVerdict::BadPassword
        }
    }
}

fn to_identity_record(user: User) -> IdentityRecord {
    IdentityRecord {
        name: user.name,
        uid: user.uid,
        gid: user.gid,
        home: Utf8PathBuf::from_path_buf(user.dir).ok(),
        shell: Utf8PathBuf::from_path_buf(user.shell).ok(),
    }
}

fn to_group_record(group: Group) -> GroupRecord {
    GroupRecord {
        name: group.name,
        gid: group.gid,
    }
}

/// Calls `getgrouplist(3)` to enumerate every gid `user` belongs to,
/// including `primary_gid`, growing the buffer until the call succeeds.
fn gid_list(user: &str, primary_gid: Gid) -> Vec<Gid> {
    let Ok(c_user) = CString::new(user) else {
        return vec![primary_gid];
    };

    let mut ngroups: libc::c_int = 16;
    loop {
        let mut buf: Vec<libc::gid_t> = vec![0; usize_from_c_int(ngroups)];
        // SAFETY: `buf` has `ngroups` elements and `ngroups` is updated
        // in place by the call to reflect how many were written, or how
        // many are required if the buffer was too small.
        let rc = unsafe {
            libc::getgrouplist(
                c_user.as_ptr(),
                primary_gid.as_raw(),
                buf.as_mut_ptr(),
                &raw mut ngroups,
            )
        };
        if rc >= 0 {
            buf.truncate(usize_from_c_int(ngroups));
            return buf.into_iter().map(Gid::from_raw).collect();
        }
        if ngroups > 1 << 16 {
            return vec![primary_gid];
        }
        ngroups = ngroups.saturating_mul(2);
    }
}

fn usize_from_c_int(value: libc::c_int) -> usize {
    value.max(0).unsigned_abs() as usize
}
