//! The Session Gatekeeper: the per-connection `USER`/`PASS` state machine.
//!
//! Enforces admission limits, the login-attempt retry cap, and the login
//! timer, and hands a successful verification off to the Privilege
//! Installer via [`PassOutcome::Installed`].

pub mod attempt;
pub mod timer;

pub use attempt::{LoginAttempt, PromptPolicy};
pub use timer::LoginTimer;

use std::sync::Arc;

use secrecy::SecretString;

use crate::config::resolver::EffectiveScope;
use crate::config::scope::ServerScope;
use crate::credential::{self, Attempt as CredentialAttempt, CredentialOutcome};
use crate::identity::IdentityProvider;
use crate::observability::{audit_event, AuditSeverity};
use crate::runstate::RunStateRegistry;
use crate::wire::{render_limit_template, Response};

/// The gatekeeper's coarse connection state. `VERIFYING` and `INSTALLING`
/// are represented as the transient control flow inside
/// [`SessionGatekeeper::on_pass`] rather than as states the caller
/// observes, since nothing can interleave with them inside one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatekeeperState {
    /// No `USER` has been accepted yet.
    Start,
    /// A `USER` has been accepted; awaiting `PASS`.
    AwaitingPass,
    /// The connection has ended (authenticated and handed off, or refused).
    Closed,
}

/// Static identity of the virtual server this connection landed on, used
/// for admission counting.
#[derive(Debug, Clone)]
pub struct VirtualHost {
    /// Listening IP address.
    pub server_ip: String,
    /// Listening port.
    pub server_port: u16,
}

/// Outcome of an `on_user` call.
#[derive(Debug, Clone)]
pub enum UserOutcome {
    /// Send this response and await `PASS`.
    Prompt(Response),
    /// Send this response and close the connection.
    Closed(Response),
}

/// Outcome of an `on_pass` call.
#[derive(Debug)]
pub enum PassOutcome {
    /// Credentials verified; hand off to the Privilege Installer with the
    /// resolved attempt and verification outcome.
    Installed {
        /// The attempt as it stood at the moment of successful verification.
        attempt: LoginAttempt,
        /// The credential verifier's outcome, including any binding promotion.
        credential: CredentialOutcome,
    },
    /// Send this response and return to `AWAITING_PASS`.
    Retry(Response),
    /// Send this response and close the connection.
    Closed(Response),
}

/// The per-connection `USER`/`PASS` state machine.
pub struct SessionGatekeeper {
    state: GatekeeperState,
    pid: u32,
    peer_addr: String,
    vhost: VirtualHost,
    config: Arc<ServerScope>,
    identity: Arc<dyn IdentityProvider>,
    registry: Arc<RunStateRegistry>,
    attempt: Option<LoginAttempt>,
}

impl SessionGatekeeper {
    /// Creates a gatekeeper in `START` for a newly-accepted connection.
    #[must_use]
    pub fn new(
        pid: u32,
        peer_addr: String,
        vhost: VirtualHost,
        config: Arc<ServerScope>,
        identity: Arc<dyn IdentityProvider>,
        registry: Arc<RunStateRegistry>,
    ) -> Self {
        Self {
            state: GatekeeperState::Start,
            pid,
            peer_addr,
            vhost,
            config,
            identity,
            registry,
            attempt: None,
        }
    }

    /// Returns the current coarse state.
    #[must_use]
    pub const fn state(&self) -> GatekeeperState {
        self.state
    }

    /// Handles any command received while still in `START`. Only `USER` is
    /// accepted there; everything else gets the generic "please login"
    /// refusal the dispatcher's gate function is expected to send.
    #[must_use]
    pub const fn refuse_before_login() -> Response {
        Response::login_with_user_first()
    }

    /// Handles a `USER <name>` command.
    pub fn on_user(&mut self, name: Option<&str>) -> UserOutcome {
        let Some(name) = name else {
            return UserOutcome::Prompt(Response::missing_parameter("USER"));
        };

        if self.state == GatekeeperState::Closed {
            return UserOutcome::Closed(Response::already_logged_in());
        }

        let membership = crate::identity::AsGroupMembership(self.identity.as_ref());
        let resolved = self.config.resolve(name, &membership);

        let anon_index = resolved.scope.anon_index();
        let auth_alias_only_rejects = self.config.violates_auth_alias_only(&resolved);

        let prompt_policy = if self.config.lookup_bool(anon_index, "LoginPasswordPrompt").unwrap_or(true) {
            PromptPolicy::DeferToPass
        } else {
            PromptPolicy::Immediate
        };

        let limit_denial = self.check_admission_limits(anon_index);

        let known_failure = auth_alias_only_rejects || limit_denial.is_some();

        let anon_binding = self.build_anon_binding(&resolved);

        let attempt = LoginAttempt {
            original_user: resolved.original_user.clone(),
            resolved_user: if auth_alias_only_rejects { None } else { resolved.effective_user.clone() },
            scope: resolved.scope,
            anon_binding,
            anon_name: resolved
                .scope
                .anon_index()
                .and_then(|idx| self.config.anonymous_blocks.get(idx))
                .map(|block| block.owner.clone()),
            anon_group: None,
            prompt_policy,
            attempt_count: 0,
            known_failure,
        };

        self.attempt = Some(attempt);

        if let Some(denial) = limit_denial {
            self.state = GatekeeperState::Closed;
            audit_event!(AuditSeverity::Notice, name, self.peer_addr, "admission limit exceeded");
            return UserOutcome::Closed(denial);
        }

        if prompt_policy == PromptPolicy::Immediate && known_failure {
            self.state = GatekeeperState::Closed;
            audit_event!(AuditSeverity::Notice, name, self.peer_addr, "login rejected at USER time");
            return UserOutcome::Closed(Response::login_incorrect());
        }

        self.state = GatekeeperState::AwaitingPass;

        let prompt = if matches!(
            self.attempt.as_ref().and_then(|a| a.anon_binding.as_ref()),
            Some(_)
        ) {
            Response::anonymous_prompt()
        } else {
            Response::password_required(name)
        };

        UserOutcome::Prompt(prompt)
    }

    /// Handles a `PASS <cleartext>` command.
    pub fn on_pass(&mut self, cleartext: Option<SecretString>) -> PassOutcome {
        let Some(cleartext) = cleartext else {
            return PassOutcome::Retry(Response::missing_parameter("PASS"));
        };

        if self.state != GatekeeperState::AwaitingPass {
            return PassOutcome::Closed(Response::login_with_user_first());
        }

        let Some(attempt) = self.attempt.clone() else {
            return PassOutcome::Closed(Response::login_with_user_first());
        };

        if attempt.known_failure || attempt.resolved_user.is_none() {
            return self.fail_attempt(attempt, "policy failure");
        }

        let resolved_user = attempt.resolved_user.clone().unwrap_or_default();
        let anon_index = attempt.scope.anon_index();
        let root_login_allowed = self.config.lookup_bool(anon_index, "RootLogin").unwrap_or(false);

        let credential_attempt = CredentialAttempt {
            original_user: &attempt.original_user,
            resolved_user: &resolved_user,
            anon_binding: attempt.anon_binding.clone(),
            anon_index,
            root_login_allowed,
            peer_addr: &self.peer_addr,
        };

        let outcome = credential::verify(&credential_attempt, cleartext, &self.config, self.identity.as_ref());

        if outcome.is_ok() {
            self.state = GatekeeperState::Closed;
            return PassOutcome::Installed { attempt, credential: outcome };
        }

        audit_event!(AuditSeverity::Notice, attempt.original_user, self.peer_addr, outcome.verdict.audit_reason());
        self.fail_attempt(attempt, outcome.verdict.audit_reason())
    }

    fn fail_attempt(&mut self, mut attempt: LoginAttempt, _reason: &str) -> PassOutcome {
        attempt.attempt_count += 1;
        let max_attempts = self
            .config
            .lookup_int(attempt.scope.anon_index(), "MaxLoginAttempts")
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(3);

        if attempt.attempt_count >= max_attempts {
            self.state = GatekeeperState::Closed;
            self.attempt = None;
            audit_event!(AuditSeverity::Notice, attempt.original_user, self.peer_addr, "maximum login attempts exceeded");
            return PassOutcome::Closed(Response::login_incorrect());
        }

        self.state = GatekeeperState::AwaitingPass;
        self.attempt = Some(attempt);
        PassOutcome::Retry(Response::login_incorrect())
    }

    fn check_admission_limits(&self, anon_index: Option<usize>) -> Option<Response> {
        let max_per_host = self.config.lookup_int(anon_index, "MaxClientsPerHost");
        if let Some(max) = max_per_host {
            let Ok(max) = u32::try_from(max) else { return None };
            let count = self
                .registry
                .count_from_peer(&self.peer_addr, &self.vhost.server_ip, self.vhost.server_port)
                .unwrap_or(0);
            if count as u64 >= u64::from(max) {
                let template = self
                    .config
                    .lookup_str(anon_index, "MaxClientsPerHostMessage")
                    .unwrap_or("Only one from %m");
                return Some(Response::limit_exceeded(&render_limit_template(template, max)));
            }
        }

        let max_clients = self.config.lookup_int(anon_index, "MaxClients");
        if let Some(max) = max_clients {
            let Ok(max) = u32::try_from(max) else { return None };
            let count = self
                .registry
                .count_on_vhost(&self.vhost.server_ip, self.vhost.server_port)
                .unwrap_or(0);
            if count as u64 >= u64::from(max) {
                let template = self
                    .config
                    .lookup_str(anon_index, "MaxClientsMessage")
                    .unwrap_or("Sorry, the maximum number of clients (%m) are already connected.");
                return Some(Response::limit_exceeded(&render_limit_template(template, max)));
            }
        }

        None
    }

    fn build_anon_binding(&self, resolved: &crate::config::resolver::ResolvedLogin) -> Option<crate::context::AnonymousBinding> {
        use crate::context::AnonymousBinding;

        if resolved.synthetic_anonymous {
            let home = self
                .identity
                .user_by_name(&resolved.original_user)
                .and_then(|record| record.home)?;
            return Some(AnonymousBinding::Synthetic {
                root: home,
                require_password: self.config.lookup_bool(None, "AnonRequirePassword").unwrap_or(true),
            });
        }

        match resolved.scope {
            EffectiveScope::Anonymous(idx) => {
                let block = self.config.anonymous_blocks.get(idx)?;
                Some(AnonymousBinding::Configured {
                    anon_index: idx,
                    root: block.root.clone(),
                    require_password: self.config.lookup_bool(Some(idx), "AnonRequirePassword").unwrap_or(true),
                    userdir_root: block.userdir_root(),
                })
            }
            EffectiveScope::Server => None,
        }
    }

    /// Returns the connection's process id, used for run-state records.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }
}
