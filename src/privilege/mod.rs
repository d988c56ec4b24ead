//! The Privilege Installer: chroot, supplementary-group setup, UID/GID
//! drop, and initial chdir, executed in a fixed, non-negotiable order.

pub mod checks;
pub mod groups;
pub mod guard;
pub mod installer;
pub mod paths;

pub use guard::PrivilegeBracket;
pub use installer::{install, InstallRequest, InstallerPaths, InstallerPolicy};
