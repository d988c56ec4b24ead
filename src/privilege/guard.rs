//! RAII guards bracketing privileged operations performed while the worker
//! still holds its bootstrap (root) identity.

use camino::Utf8Path;
use color_eyre::eyre::{eyre, Context};
use nix::sys::signal::{self, SigSet, SigmaskHow};
use nix::unistd::{Gid, Uid, chroot, getegid, geteuid, setegid, seteuid};

use crate::error::{PrivilegeError, PrivilegeResult};

/// Temporarily elevates the effective uid/gid to 0, restoring the prior
/// effective ids on drop (best-effort; drop never panics).
///
/// This brackets steps 7, 8, and 9 of the Privilege Installer: the worker
/// starts privileged and these brackets scope exactly how long that
/// privilege is held.
pub struct PrivilegeBracket {
    prior_euid: Uid,
    prior_egid: Gid,
}

impl PrivilegeBracket {
    /// Enters the bracket, setting effective uid/gid to 0.
    pub fn elevate() -> PrivilegeResult<Self> {
        let prior_euid = geteuid();
        let prior_egid = getegid();

        setegid(Gid::from_raw(0)).with_context(|| "setegid(0) failed").map_err(PrivilegeError::from)?;
        if let Err(err) = seteuid(Uid::from_raw(0)) {
            let _ = setegid(prior_egid);
            return Err(PrivilegeError::from(eyre!(err).wrap_err("seteuid(0) failed")));
        }

        Ok(Self { prior_euid, prior_egid })
    }

    fn restore_best_effort(&self) {
        let _ = seteuid(self.prior_euid);
        let _ = setegid(self.prior_egid);
    }
}

impl Drop for PrivilegeBracket {
    fn drop(&mut self) {
        self.restore_best_effort();
    }
}

/// Blocks all signals for the duration of `body`, restoring the prior mask
/// on return. Used around the final real-and-effective UID/GID transition
/// so a timer callback cannot observe half-transitioned state.
pub fn with_signals_blocked<F, R>(body: F) -> PrivilegeResult<R>
where
    F: FnOnce() -> PrivilegeResult<R>,
{
    let all = SigSet::all();
    let mut prior = SigSet::empty();
    signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&all), Some(&mut prior))
        .with_context(|| "sigprocmask block failed")
        .map_err(PrivilegeError::from)?;

    let result = body();

    let _ = signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&prior), None);

    result
}

/// Chroots into `root`, which must already be canonicalized; chroot failure
/// is session-fatal.
pub fn chroot_into(root: &Utf8Path) -> PrivilegeResult<()> {
    chroot(root.as_std_path())
        .with_context(|| format!("chroot to {}", root.as_str()))
        .map_err(PrivilegeError::from)
}
