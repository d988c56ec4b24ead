//! Domain error types for the FTP authentication and privilege-transition core.

use color_eyre::Report;
use thiserror::Error;

/// Result alias for operations that may return a top-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias for configuration-resolution fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for credential-verification fallible operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Result alias for session-gatekeeper fallible operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result alias for privilege-management fallible operations.
pub type PrivilegeResult<T> = std::result::Result<T, PrivilegeError>;

/// Top-level error exposed by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Indicates configuration resolution failed.
    #[error("configuration resolution failed")]
    Config(#[from] ConfigError),
    /// Indicates credential verification failed.
    #[error("credential verification failed")]
    Credential(#[from] CredentialError),
    /// Indicates the session gatekeeper rejected the connection.
    #[error("session gatekeeper failed")]
    Session(#[from] SessionError),
    /// Indicates privilege management failed.
    #[error("privilege management failed")]
    Privilege(#[from] PrivilegeError),
}

/// Captures configuration-resolution failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);

/// Captures credential-verification failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct CredentialError(#[from] Report);

/// Captures session-gatekeeper failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct SessionError(#[from] Report);

/// Captures privilege-management failures. Any error of this type that
/// surfaces from step 7 onward of the Privilege Installer is session-fatal:
/// the caller must hard-exit the worker rather than attempt recovery.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PrivilegeError(#[from] Report);

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        let ConfigError(report) = err;
        Self(report)
    }
}

impl From<CredentialError> for SessionError {
    fn from(err: CredentialError) -> Self {
        let CredentialError(report) = err;
        Self(report)
    }
}

impl From<PrivilegeError> for SessionError {
    fn from(err: PrivilegeError) -> Self {
        let PrivilegeError(report) = err;
        Self(report)
    }
}

impl From<Error> for SessionError {
    fn from(err: Error) -> Self {
        match err {
            Error::Config(inner) => inner.into(),
            Error::Credential(inner) => {
                let CredentialError(report) = inner;
                Self(report)
            }
            Error::Session(inner) => inner,
            Error::Privilege(inner) => inner.into(),
        }
    }
}
