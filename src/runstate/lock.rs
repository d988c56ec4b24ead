//! Advisory file locking for the run-state registry.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

use camino::Utf8Path;

use crate::error::SessionError;

/// Holds an exclusive `flock(2)` lock on the registry file until dropped.
pub struct RunStateLock {
    _file: File,
}

impl RunStateLock {
    /// Acquires an exclusive lock on the registry file at `path`, creating
    /// it if absent.
    pub fn acquire(path: &Utf8Path) -> Result<Self, SessionError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_std_path())
            .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err).wrap_err("open run-state lock file")))?;

        // SAFETY: `file`'s descriptor is valid and owned by this scope for
        // the duration of the call; nothing else closes or moves it.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if result != 0 {
            return Err(SessionError::from(
                color_eyre::eyre::eyre!(std::io::Error::last_os_error()).wrap_err("flock run-state registry"),
            ));
        }

        Ok(Self { _file: file })
    }
}
