//! Canonicalization and chroot-relative path arithmetic.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::Context;

use crate::error::{PrivilegeError, PrivilegeResult};

/// Canonicalizes `path`, mapping any failure to a session-fatal
/// [`PrivilegeError`]. Canonicalization failure before any privilege change
/// must reject the login outright.
pub fn canonicalize(path: &Utf8Path) -> PrivilegeResult<Utf8PathBuf> {
    let canonical = std::fs::canonicalize(path.as_std_path())
        .with_context(|| format!("canonicalize {}", path.as_str()))
        .map_err(PrivilegeError::from)?;
    Utf8PathBuf::from_path_buf(canonical)
        .map_err(|_| PrivilegeError::from(color_eyre::eyre::eyre!("canonicalized path is not UTF-8")))
}

/// Computes the final anonymous root: appends `username` to `declared_root`
/// and canonicalizes when `userdir_root` is set and a username component is
/// present and differs from the anon block's `owner_name`; otherwise
/// canonicalizes `declared_root` alone.
///
/// Per the recorded open-question decision, a `username` equal to the anon
/// block's own owner name is treated as no username component at all, since
/// that matches the reference's observed behaviour and avoids a redundant
/// `<root>/<owner>` path.
pub fn compute_anon_root(
    declared_root: &Utf8Path,
    userdir_root: bool,
    username: Option<&str>,
    owner_name: Option<&str>,
) -> PrivilegeResult<Utf8PathBuf> {
    match (userdir_root, username) {
        (true, Some(name)) if !name.is_empty() && Some(name) != owner_name => canonicalize(&declared_root.join(name)),
        _ => canonicalize(declared_root),
    }
}

/// Adjusts a recorded cwd after a chroot to `new_root`: if `original_cwd`
/// lay inside `new_root`, strips the root prefix and prepends `/`;
/// otherwise resets to `/`.
#[must_use]
pub fn adjust_cwd_after_chroot(original_cwd: &Utf8Path, new_root: &Utf8Path) -> Utf8PathBuf {
    original_cwd.strip_prefix(new_root).map_or_else(
        |_| Utf8PathBuf::from("/"),
        |relative| Utf8PathBuf::from("/").join(relative),
    )
}
