//! Demonstrates a single `USER`/`PASS` exchange through the authentication
//! core, using the local identity provider and a temporary run-state
//! registry. Intended as a manual smoke-test harness, not a real server.

use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::eyre::{eyre, Context, Result};
use ortho_config::OrthoConfig;
use secrecy::SecretString;

use ftpd_auth_core::config::ServerScope;
use ftpd_auth_core::identity::LocalIdentityProvider;
use ftpd_auth_core::runstate::RunStateRegistry;
use ftpd_auth_core::session::{PassOutcome, SessionGatekeeper, UserOutcome, VirtualHost};
use ftpd_auth_core::wire::Response;
use ftpd_auth_core::CoreSettings;

/// Drives one `USER`/`PASS` exchange against an empty (server-scope-only)
/// configuration, using the host's real user and group databases.
#[derive(Debug, Parser)]
struct Args {
    /// Login name to send as `USER`.
    user: String,
    /// Cleartext password to send as `PASS`.
    password: String,
    /// Peer address to simulate, for admission counting.
    #[arg(long, default_value = "203.0.113.1:4021")]
    peer_addr: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let settings = CoreSettings::load().context("failed to load configuration via OrthoConfig")?;
    let run_state_path = Utf8PathBuf::from_path_buf(settings.run_state_path())
        .map_err(|path| eyre!("run-state path is not UTF-8: {}", path.display()))?;
    let registry = RunStateRegistry::new(run_state_path);
    let config = Arc::new(ServerScope::new());
    let identity = Arc::new(LocalIdentityProvider::new());

    let mut gatekeeper = SessionGatekeeper::new(
        std::process::id(),
        args.peer_addr,
        VirtualHost { server_ip: "0.0.0.0".to_owned(), server_port: 21 },
        config,
        identity,
        registry,
    );

    match gatekeeper.on_user(Some(&args.user)) {
        UserOutcome::Prompt(response) => tracing::info!(code = response.code, text = %response.text, "USER prompt"),
        UserOutcome::Closed(response) => {
            tracing::info!(code = response.code, text = %response.text, "USER closed connection");
            return Ok(());
        }
    }

    match gatekeeper.on_pass(Some(SecretString::from(args.password))) {
        PassOutcome::Installed { attempt, credential } => {
            let user = attempt.resolved_user.as_deref().unwrap_or("");
            let response = Response::login_ok(user, credential.anon_binding.is_some(), None);
            tracing::info!(code = response.code, text = %response.text, "authenticated");
        }
        PassOutcome::Retry(response) | PassOutcome::Closed(response) => {
            tracing::info!(code = response.code, text = %response.text, "PASS rejected");
        }
    }

    Ok(())
}
