//! The transient, per-connection login attempt record.

use crate::config::resolver::EffectiveScope;
use crate::context::AnonymousBinding;

/// Whether login-resolution failures surface immediately at `USER` time or
/// are deferred until `PASS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPolicy {
    /// Surface a known failure immediately, without prompting for a password.
    Immediate,
    /// Always prompt for a password, even if resolution already knows the
    /// login will fail.
    DeferToPass,
}

/// The per-connection login attempt: created on `USER`, mutated on re-issue,
/// consumed by `PASS`.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    /// The name as typed by the client.
    pub original_user: String,
    /// The name after alias rewriting; `None` only when `prompt_policy` is
    /// [`PromptPolicy::DeferToPass`] and resolution rejected the login.
    pub resolved_user: Option<String>,
    /// The scope the login resolved into.
    pub scope: EffectiveScope,
    /// The anonymous binding in effect, if any.
    pub anon_binding: Option<AnonymousBinding>,
    /// The canonical name of the anon block's owner, if applicable.
    pub anon_name: Option<String>,
    /// A group override from the credential verifier's group-password
    /// fallback, if applicable.
    pub anon_group: Option<String>,
    /// Whether failures are surfaced before or after `PASS`.
    pub prompt_policy: PromptPolicy,
    /// Number of failed `PASS` attempts against this `LoginAttempt`.
    pub attempt_count: u32,
    /// Whether resolution already determined this login will fail
    /// (unknown alias, limit denial, or `AuthAliasOnly` rejection).
    pub known_failure: bool,
}

impl LoginAttempt {
    /// Returns whether *resolved-user* is null, per the data model's
    /// invariant that this is only valid when deferring to `PASS`.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        self.resolved_user.is_none()
    }
}
