//! Verdict types returned by the Credential Verifier.

use crate::context::AnonymousBinding;

/// The specific outcome of a credential check, kept distinct from the wire
/// response so operator audit logs can record which check failed even
/// though the client only ever sees a generic 530.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The credential matched.
    Ok,
    /// No account by this name exists in the backend.
    NoSuchUser,
    /// The account exists but the password did not match.
    BadPassword,
    /// The account exists but its credential has expired.
    Expired,
    /// The account exists but is administratively disabled.
    Disabled,
}

impl Verdict {
    /// Returns the audit-log reason string for a non-ok verdict.
    #[must_use]
    pub const fn audit_reason(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoSuchUser => "no such user",
            Self::BadPassword => "bad password",
            Self::Expired => "password expired",
            Self::Disabled => "account disabled",
        }
    }
}

/// The full result of a [`super::verify`] call: the verdict plus any
/// binding promotion produced by the group-password fallback.
#[derive(Debug, Clone)]
pub struct CredentialOutcome {
    /// The final verdict.
    pub verdict: Verdict,
    /// The anonymous binding in effect after verification, which may have
    /// been promoted by a `GroupPassword` hit inside an anonymous block.
    pub anon_binding: Option<AnonymousBinding>,
    /// The matched group name, if the group-password fallback promoted a
    /// non-anon login rather than adopting an anonymous block.
    pub anon_group: Option<String>,
}

impl CredentialOutcome {
    /// Returns whether the verdict is [`Verdict::Ok`].
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self.verdict, Verdict::Ok)
    }
}
