//! The Credential Verifier: combines the anonymous-no-password shortcut,
//! the inline-`UserPassword`-or-backend-`authenticate` primary check, and
//! the `GroupPassword` fallback into a single verdict.

pub mod verdict;

pub use verdict::{CredentialOutcome, Verdict};

use nix::unistd::Uid;
use secrecy::SecretString;

use crate::config::scope::ServerScope;
use crate::context::AnonymousBinding;
use crate::identity::{IdentityProvider, PasswordVerdict};
use crate::observability::{audit_event, AuditSeverity};

/// A login attempt as seen by the verifier: the resolved user, the scope it
/// was resolved into, and the anonymous binding, if any.
#[derive(Debug, Clone)]
pub struct Attempt<'a> {
    /// The name as typed by the client on `USER`.
    pub original_user: &'a str,
    /// The name after alias rewriting.
    pub resolved_user: &'a str,
    /// The anonymous binding in effect, if any.
    pub anon_binding: Option<AnonymousBinding>,
    /// The anonymous-block index to use for scoped directive lookups, if any.
    pub anon_index: Option<usize>,
    /// Whether `RootLogin` is permitted at the active scope.
    pub root_login_allowed: bool,
    /// The peer address, for audit logging.
    pub peer_addr: &'a str,
}

/// Verifies `cleartext` against `attempt`, consulting `config` for
/// `UserPassword`/`GroupPassword` directives and `provider` for backend
/// authentication and group membership.
///
/// Implements a fixed four-step order: anonymous shortcut, primary check,
/// group-password fallback, and the first-non-ok-code rule when every path
/// fails. The cleartext buffer is consumed by this call and zeroed on every
/// return path.
#[must_use]
pub fn verify(
    attempt: &Attempt<'_>,
    cleartext: SecretString,
    config: &ServerScope,
    provider: &dyn IdentityProvider,
) -> CredentialOutcome {
    let outcome = verify_inner(attempt, &cleartext, config, provider);
    drop(cleartext);
    outcome
}

fn verify_inner(
    attempt: &Attempt<'_>,
    cleartext: &SecretString,
    config: &ServerScope,
    provider: &dyn IdentityProvider,
) -> CredentialOutcome {
    if let Some(binding) = &attempt.anon_binding {
        if !binding.require_password() {
            return CredentialOutcome {
                verdict: Verdict::Ok,
                anon_binding: Some(binding.clone()),
                anon_group: None,
            };
        }
    }

    let primary = primary_check(attempt, cleartext, config, provider);

    let outcome = if primary.is_ok() {
        CredentialOutcome {
            verdict: Verdict::Ok,
            anon_binding: attempt.anon_binding.clone(),
            anon_group: None,
        }
    } else {
        group_password_fallback(attempt, cleartext, config, provider, primary)
    };

    enforce_root_login(attempt, outcome, provider)
}

fn primary_check(
    attempt: &Attempt<'_>,
    cleartext: &SecretString,
    config: &ServerScope,
    provider: &dyn IdentityProvider,
) -> Verdict {
    let stored = config
        .user_passwords
        .iter()
        .find(|directive| directive.subject == attempt.resolved_user && directive.owner_anon_index == attempt.anon_index)
        .map(|directive| directive.stored_hash.as_str());

    match stored {
        Some(hash) => verdict_from_check(cleartext, hash),
        None => verdict_from_provider(provider.authenticate(attempt.resolved_user, cleartext)),
    }
}

fn group_password_fallback(
    attempt: &Attempt<'_>,
    cleartext: &SecretString,
    config: &ServerScope,
    provider: &dyn IdentityProvider,
    primary: Verdict,
) -> CredentialOutcome {
    for directive in &config.group_passwords {
        if !provider.is_member(attempt.resolved_user, &directive.subject) {
            continue;
        }
        if verdict_from_check(cleartext, &directive.stored_hash) != Verdict::Ok {
            continue;
        }

        let anon_binding = if directive.owner_anon_index.is_some() {
            attempt.anon_binding.clone()
        } else {
            None
        };

        return CredentialOutcome {
            verdict: Verdict::Ok,
            anon_binding,
            anon_group: if directive.owner_anon_index.is_none() {
                Some(directive.subject.clone())
            } else {
                None
            },
        };
    }

    CredentialOutcome {
        verdict: primary,
        anon_binding: None,
        anon_group: None,
    }
}

fn enforce_root_login(attempt: &Attempt<'_>, outcome: CredentialOutcome, provider: &dyn IdentityProvider) -> CredentialOutcome {
    let is_root = provider.user_by_name(attempt.resolved_user).map(|record| record.uid) == Some(Uid::from_raw(0));

    if outcome.verdict != Verdict::Ok || !is_root {
        return outcome;
    }

    if attempt.root_login_allowed {
        audit_event!(AuditSeverity::Warning, attempt.resolved_user, attempt.peer_addr, "root login permitted by RootLogin");
        outcome
    } else {
        audit_event!(AuditSeverity::Critical, attempt.resolved_user, attempt.peer_addr, "root login refused: RootLogin not set");
        CredentialOutcome {
            verdict: Verdict::BadPassword,
            anon_binding: None,
            anon_group: None,
        }
    }
}

fn verdict_from_check(cleartext: &SecretString, stored_hash: &str) -> Verdict {
    if crate::identity::local::verify_salted_sha256(cleartext, stored_hash) {
        Verdict::Ok
    } else {
        Verdict::BadPassword
    }
}

fn verdict_from_provider(raw: PasswordVerdict) -> Verdict {
    match raw {
        PasswordVerdict::Ok => Verdict::Ok,
        PasswordVerdict::NoSuchUser => Verdict::NoSuchUser,
        PasswordVerdict::BadPassword => Verdict::BadPassword,
        PasswordVerdict::Expired => Verdict::Expired,
        PasswordVerdict::Disabled => Verdict::Disabled,
    }
}

impl Verdict {
    const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}
