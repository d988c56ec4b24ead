//! Authentication and privilege-transition core for an FTP server control
//! channel.
//!
//! This crate gates the control channel until a client proves identity via
//! `USER`/`PASS`, then transitions the per-connection worker from a
//! privileged bootstrap state into a sandboxed, least-privilege runtime
//! bound to a specific identity and filesystem root. It is deliberately
//! narrow: the command dispatcher, control-channel framing, configuration
//! file parser, and the identity-provider backend's own storage are all
//! external collaborators this crate only calls into.
//!
//! The five cooperating components, in dependency order:
//!
//! - [`config`] — the Config Resolver, mapping a login name to an effective
//!   user and anonymous binding.
//! - [`identity`] — the Identity Provider Facade, a uniform interface over
//!   user/group lookup and password-check backends.
//! - [`credential`] — the Credential Verifier, combining inline, group, and
//!   backend password checks into one verdict.
//! - [`session`] — the Session Gatekeeper, the `USER`→`PASS`→authenticated
//!   state machine.
//! - [`privilege`] — the Privilege Installer, performing chroot, group
//!   list setup, UID/GID drop, and initial chdir in the required order.

pub mod config;
pub mod context;
pub mod credential;
pub mod error;
pub mod identity;
pub mod observability;
pub mod privilege;
pub mod runstate;
pub mod session;
pub mod settings;
pub mod wire;

#[cfg(any(test, feature = "cluster-unit-tests"))]
pub mod test_support;

pub use context::{AnonymousBinding, SessionContext};
pub use error::{Error, Result};
pub use settings::CoreSettings;
