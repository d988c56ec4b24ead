//! Coverage for `MaxClients`/`MaxClientsPerHost` admission counting inside
//! the Session Gatekeeper, exercised through `on_user` rather than the
//! registry directly, since the limit message template and the 530 close
//! are the gatekeeper's responsibility.

#![cfg(feature = "cluster-unit-tests")]

use std::sync::Arc;

use ftpd_auth_core::runstate::SessionRecord;
use ftpd_auth_core::session::{SessionGatekeeper, UserOutcome, VirtualHost};
use ftpd_auth_core::test_support::mock_identity::single_account;
use ftpd_auth_core::test_support::{scope_with_directives, temp_registry};
use rstest::rstest;

fn vhost() -> VirtualHost {
    VirtualHost { server_ip: "198.51.100.9".to_owned(), server_port: 21 }
}

#[rstest]
fn max_clients_per_host_refuses_a_second_connection_from_the_same_peer() {
    let config = Arc::new(scope_with_directives(&[("MaxClientsPerHost", "1")]));
    let identity = Arc::new(single_account("alice", "correct"));
    let (registry, _guard) = temp_registry();

    registry
        .upsert(SessionRecord {
            pid: 900,
            server_ip: vhost().server_ip,
            server_port: vhost().server_port,
            user: None,
            peer_addr: "203.0.113.20:4021".to_owned(),
        })
        .expect("seed existing session");

    let mut gatekeeper =
        SessionGatekeeper::new(901, "203.0.113.20:4021".to_owned(), vhost(), config, identity, registry);

    let outcome = gatekeeper.on_user(Some("alice"));
    match outcome {
        UserOutcome::Closed(response) => assert_eq!(response.code, 530),
        UserOutcome::Prompt(response) => panic!("expected admission refusal, got {response:?}"),
    }
}

#[rstest]
fn max_clients_per_host_allows_a_connection_from_a_different_peer() {
    let config = Arc::new(scope_with_directives(&[("MaxClientsPerHost", "1")]));
    let identity = Arc::new(single_account("alice", "correct"));
    let (registry, _guard) = temp_registry();

    registry
        .upsert(SessionRecord {
            pid: 900,
            server_ip: vhost().server_ip,
            server_port: vhost().server_port,
            user: None,
            peer_addr: "203.0.113.20:4021".to_owned(),
        })
        .expect("seed existing session");

    let mut gatekeeper =
        SessionGatekeeper::new(902, "203.0.113.21:4021".to_owned(), vhost(), config, identity, registry);

    assert!(matches!(gatekeeper.on_user(Some("alice")), UserOutcome::Prompt(_)));
}

#[rstest]
fn max_clients_refuses_once_the_vhost_wide_cap_is_reached() {
    let config = Arc::new(scope_with_directives(&[("MaxClients", "2")]));
    let identity = Arc::new(single_account("alice", "correct"));
    let (registry, _guard) = temp_registry();

    for (pid, peer) in [(910, "203.0.113.30:4021"), (911, "203.0.113.31:4021")] {
        registry
            .upsert(SessionRecord {
                pid,
                server_ip: vhost().server_ip,
                server_port: vhost().server_port,
                user: None,
                peer_addr: peer.to_owned(),
            })
            .expect("seed existing session");
    }

    let mut gatekeeper =
        SessionGatekeeper::new(912, "203.0.113.32:4021".to_owned(), vhost(), config, identity, registry);

    let outcome = gatekeeper.on_user(Some("alice"));
    match outcome {
        UserOutcome::Closed(response) => {
            assert_eq!(response.code, 530);
            assert!(response.text.contains('2'));
        }
        UserOutcome::Prompt(response) => panic!("expected admission refusal, got {response:?}"),
    }
}

#[rstest]
fn max_clients_message_template_substitutes_the_configured_limit() {
    let config = Arc::new(scope_with_directives(&[
        ("MaxClientsPerHost", "1"),
        ("MaxClientsPerHostMessage", "Only %m connection per host allowed."),
    ]));
    let identity = Arc::new(single_account("alice", "correct"));
    let (registry, _guard) = temp_registry();

    registry
        .upsert(SessionRecord {
            pid: 920,
            server_ip: vhost().server_ip,
            server_port: vhost().server_port,
            user: None,
            peer_addr: "203.0.113.40:4021".to_owned(),
        })
        .expect("seed existing session");

    let mut gatekeeper =
        SessionGatekeeper::new(921, "203.0.113.40:4021".to_owned(), vhost(), config, identity, registry);

    let outcome = gatekeeper.on_user(Some("alice"));
    match outcome {
        UserOutcome::Closed(response) => assert_eq!(response.text, "Only 1 connection per host allowed."),
        UserOutcome::Prompt(response) => panic!("expected admission refusal, got {response:?}"),
    }
}
