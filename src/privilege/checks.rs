//! Pre-transition policy checks: valid-shell and denied-users files.

use std::fs;

use camino::Utf8Path;
use color_eyre::eyre::Context;

use crate::error::{PrivilegeError, PrivilegeResult};

/// Returns whether `shell` appears, one per line, in the valid-shells file
/// at `path`. A missing file is treated as "no shells are valid", matching
/// the conservative reading of `RequireValidShell`.
pub fn shell_is_valid(path: &Utf8Path, shell: &str) -> PrivilegeResult<bool> {
    Ok(lines_of(path)?.iter().any(|line| line == shell))
}

/// Returns whether `user` appears, one per line, in the denied-users file
/// at `path`. A missing file is treated as "nobody is denied".
pub fn user_is_denied(path: &Utf8Path, user: &str) -> PrivilegeResult<bool> {
    Ok(lines_of(path)?.iter().any(|line| line == user))
}

fn lines_of(path: &Utf8Path) -> PrivilegeResult<Vec<String>> {
    match fs::read_to_string(path.as_std_path()) {
        Ok(contents) => Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_owned)
            .collect()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(PrivilegeError::from(
            color_eyre::eyre::eyre!(err).wrap_err(format!("read {}", path.as_str())),
        )),
    }
}
