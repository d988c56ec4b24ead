//! Wire response codes and message templates for `USER`/`PASS` exchanges.
//!
//! These are the only control-channel commands this crate's state machine
//! consumes; framing, multi-line responses, and every other command belong
//! to the out-of-scope command dispatcher.

/// A rendered control-channel response: a three-digit code and message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The three-digit FTP reply code.
    pub code: u16,
    /// The reply text, already interpolated.
    pub text: String,
}

impl Response {
    fn new(code: u16, text: impl Into<String>) -> Self {
        Self { code, text: text.into() }
    }

    /// `331 Password required for <name>.`
    #[must_use]
    pub fn password_required(name: &str) -> Self {
        Self::new(331, format!("Password required for {name}."))
    }

    /// `331 Anonymous login ok, send your complete e-mail address as password.`
    #[must_use]
    pub fn anonymous_prompt() -> Self {
        Self::new(331, "Anonymous login ok, send your complete e-mail address as password.")
    }

    /// `230` on successful PASS. `template` is the operator-configured
    /// `AccessGrantMsg`, if any, with `%u` already substituted by the
    /// caller; falls back to the built-in default text for anon vs non-anon.
    #[must_use]
    pub fn login_ok(user: &str, is_anon: bool, template: Option<&str>) -> Self {
        let text = template.map_or_else(
            || {
                if is_anon {
                    format!("Anonymous access granted for user {user}.")
                } else {
                    format!("User {user} logged in.")
                }
            },
            std::borrow::ToOwned::to_owned,
        );
        Self::new(230, text)
    }

    /// `421 Login Timeout (<n> seconds): closing control connection.`
    #[must_use]
    pub fn login_timeout(seconds: u64) -> Self {
        Self::new(421, format!("Login Timeout ({seconds} seconds): closing control connection."))
    }

    /// `503 You are already logged in!`
    #[must_use]
    pub fn already_logged_in() -> Self {
        Self::new(503, "You are already logged in!")
    }

    /// `503 Login with USER first.`
    #[must_use]
    pub fn login_with_user_first() -> Self {
        Self::new(503, "Login with USER first.")
    }

    /// `530 Login incorrect.`, the uniform failure response for policy,
    /// credential, and installer failures alike.
    #[must_use]
    pub fn login_incorrect() -> Self {
        Self::new(530, "Login incorrect.")
    }

    /// `530` with an operator-configured `MaxClients[PerHost]` template,
    /// `%m` already substituted by the caller with the limit value.
    #[must_use]
    pub fn limit_exceeded(rendered_template: &str) -> Self {
        Self::new(530, rendered_template.to_owned())
    }

    /// `500 'USER'/'PASS': command requires a parameter.`
    #[must_use]
    pub fn missing_parameter(command: &str) -> Self {
        Self::new(500, format!("'{command}': command requires a parameter."))
    }
}

/// Substitutes `%m` with `limit` in an operator-configured limit template.
#[must_use]
pub fn render_limit_template(template: &str, limit: u32) -> String {
    template.replace("%m", &limit.to_string())
}

/// Substitutes `%u` with `user` in an operator-configured `AccessGrantMsg`.
#[must_use]
pub fn render_access_grant_template(template: &str, user: &str) -> String {
    template.replace("%u", user)
}
