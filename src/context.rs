//! Cross-cutting session types shared by the Credential Verifier, Session
//! Gatekeeper, and Privilege Installer: the anonymous binding and the final
//! `SessionContext` handed to the command dispatcher.

use camino::Utf8PathBuf;
use nix::unistd::{Gid, Uid};

/// A chroot root and policy subset associated with an anonymous login,
/// either declared in configuration or synthesized from an `AnonymousGroup`
/// match.
///
/// Both variants expose the same fields so callers do not need to match on
/// the variant to read `root` or the password-requirement flag; only the
/// provenance of the config subset differs.
#[derive(Debug, Clone)]
pub enum AnonymousBinding {
    /// A real `<Anonymous ~owner>` block declared in configuration.
    Configured {
        /// Index of the anonymous block in the owning [`crate::config::ServerScope`].
        anon_index: usize,
        /// Declared chroot root, not yet canonicalized.
        root: Utf8PathBuf,
        /// Whether `AnonRequirePassword` is in effect.
        require_password: bool,
        /// Whether `UserDirRoot` is in effect.
        userdir_root: bool,
    },
    /// A binding synthesized because the login's groups matched an
    /// `AnonymousGroup` rule; the subset of applicable policy is the server
    /// scope itself.
    Synthetic {
        /// The user's home directory, used as the chroot root.
        root: Utf8PathBuf,
        /// Whether `AnonRequirePassword` is in effect at server scope.
        require_password: bool,
    },
}

impl AnonymousBinding {
    /// Returns the declared (pre-canonicalization) root.
    #[must_use]
    pub fn declared_root(&self) -> &Utf8PathBuf {
        match self {
            Self::Configured { root, .. } | Self::Synthetic { root, .. } => root,
        }
    }

    /// Returns whether a password is required for this binding.
    #[must_use]
    pub const fn require_password(&self) -> bool {
        match self {
            Self::Configured { require_password, .. } | Self::Synthetic { require_password, .. } => {
                *require_password
            }
        }
    }

    /// Returns whether `UserDirRoot` applies; always false for synthetic
    /// bindings, since they have no declared anon block to carry the flag.
    #[must_use]
    pub const fn userdir_root(&self) -> bool {
        match self {
            Self::Configured { userdir_root, .. } => *userdir_root,
            Self::Synthetic { .. } => false,
        }
    }

    /// Returns the owning anonymous-block index, if configured.
    #[must_use]
    pub const fn anon_index(&self) -> Option<usize> {
        match self {
            Self::Configured { anon_index, .. } => Some(*anon_index),
            Self::Synthetic { .. } => None,
        }
    }
}

/// Session flags surfaced to the command dispatcher after a successful
/// installation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFlags {
    /// Whether the session is anonymous.
    pub is_anon: bool,
    /// Whether the session defaults to ASCII transfer mode.
    pub ascii_mode: bool,
    /// Whether the process title should hide the supplied password.
    pub hide_password: bool,
}

/// The fully-installed, authenticated session handed to the command
/// dispatcher. Populated exactly once, atomically, by a successful
/// Privilege Installer run.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The effective account name.
    pub user: String,
    /// The effective primary group name.
    pub group: String,
    /// The effective uid, post-transition.
    pub uid: Uid,
    /// The effective primary gid, post-transition.
    pub gid: Gid,
    /// The full installed supplementary group id list, primary first.
    pub gids: Vec<Gid>,
    /// Group names parallel to `gids`.
    pub groups: Vec<String>,
    /// The chroot root, if this is an anonymous session.
    pub anon_root: Option<Utf8PathBuf>,
    /// Whether this session is anonymous.
    pub is_anon: bool,
    /// Current working directory, relative to the (possibly chrooted)
    /// filesystem view.
    pub cwd: Utf8PathBuf,
    /// Virtual working directory, as displayed to the client.
    pub vwd: Utf8PathBuf,
    /// Session flags.
    pub flags: SessionFlags,
    /// Prefix used when rendering the `ps`-style process title.
    pub proc_prefix: String,
}
