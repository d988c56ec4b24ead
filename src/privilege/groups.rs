//! Supplementary group list installation.

use color_eyre::eyre::Context;
use nix::unistd::{Gid, setgroups};

use crate::error::{PrivilegeError, PrivilegeResult};

/// Installs the supplementary group list: `primary` first, then every
/// `supplementary` gid in discovery order with duplicates (including a
/// duplicate of `primary`) removed.
///
/// Matches the data model's invariant that the GID list supplied to the OS
/// contains the primary GID exactly once, plus each supplementary GID at
/// most once.
pub fn install_group_list(primary: Gid, supplementary: &[Gid]) -> PrivilegeResult<()> {
    let mut gids = Vec::with_capacity(supplementary.len() + 1);
    gids.push(primary);
    for gid in supplementary {
        if !gids.contains(gid) {
            gids.push(*gid);
        }
    }

    setgroups(&gids).with_context(|| "setgroups failed").map_err(PrivilegeError::from)
}
