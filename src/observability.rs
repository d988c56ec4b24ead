//! Shared tracing configuration for observability instrumentation.
//!
//! Centralises the log target used by the crate so subscribers can filter
//! authentication and privilege-transition events without pulling in
//! unrelated application logs.

/// Target used by observability spans and logs.
pub(crate) const LOG_TARGET: &str = "ftpd_auth_core::observability";

/// Audit severities used by the core: `notice`, `warning`, `error`, and
/// `critical`, rather than `tracing::Level`, which has no `notice` rung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSeverity {
    /// Routine policy or credential failure; expected operator traffic.
    Notice,
    /// Unusual but explicitly permitted event (e.g. `RootLogin on`).
    Warning,
    /// Installer failure after privileges were touched.
    Error,
    /// Root credential accepted without `RootLogin` opt-in.
    Critical,
}

impl AuditSeverity {
    /// Returns the lowercase string used in the `audit.severity` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

/// Emits a structured audit event at the given severity.
///
/// Routes through `tracing` macros because the crate exposes only four
/// discrete severities and they do not line up one-to-one with
/// `tracing::Level`; callers should not interpolate `reason` into a
/// pre-formatted message elsewhere, since the field is what operator log
/// pipelines filter and aggregate on.
macro_rules! audit_event {
    ($severity:expr, $user:expr, $peer:expr, $reason:expr) => {
        match $severity {
            $crate::observability::AuditSeverity::Notice
            | $crate::observability::AuditSeverity::Warning => {
                tracing::warn!(
                    target: $crate::observability::LOG_TARGET,
                    user = %$user,
                    peer_addr = %$peer,
                    reason = %$reason,
                    audit.severity = $severity.as_str(),
                    "authentication audit event"
                );
            }
            $crate::observability::AuditSeverity::Error
            | $crate::observability::AuditSeverity::Critical => {
                tracing::error!(
                    target: $crate::observability::LOG_TARGET,
                    user = %$user,
                    peer_addr = %$peer,
                    reason = %$reason,
                    audit.severity = $severity.as_str(),
                    "authentication audit event"
                );
            }
        }
    };
}

pub(crate) use audit_event;
