//! Coverage for the run-state registry's upsert/remove/count operations
//! and the advisory-lock round trip through a real temporary file.

use ftpd_auth_core::runstate::SessionRecord;
use ftpd_auth_core::test_support::temp_registry;
use rstest::rstest;

fn record(pid: u32, peer_addr: &str) -> SessionRecord {
    SessionRecord {
        pid,
        server_ip: "198.51.100.5".to_owned(),
        server_port: 21,
        user: None,
        peer_addr: peer_addr.to_owned(),
    }
}

#[rstest]
fn upsert_then_count_on_vhost_reflects_the_new_record() {
    let (registry, _guard) = temp_registry();

    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 0);

    registry.upsert(record(100, "203.0.113.50:4021")).expect("upsert");

    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 1);
}

#[rstest]
fn upsert_replaces_the_existing_record_for_the_same_pid() {
    let (registry, _guard) = temp_registry();

    registry.upsert(record(100, "203.0.113.50:4021")).expect("upsert");
    let mut updated = record(100, "203.0.113.51:4021");
    updated.user = Some("alice".to_owned());
    registry.upsert(updated).expect("upsert replacement");

    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 1);
    assert_eq!(registry.count_from_peer("203.0.113.51:4021", "198.51.100.5", 21).expect("count"), 1);
    assert_eq!(registry.count_from_peer("203.0.113.50:4021", "198.51.100.5", 21).expect("count"), 0);
}

#[rstest]
fn remove_drops_the_record_from_vhost_and_peer_counts() {
    let (registry, _guard) = temp_registry();

    registry.upsert(record(200, "203.0.113.60:4021")).expect("upsert");
    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 1);

    registry.remove(200).expect("remove");

    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 0);
    assert_eq!(registry.count_from_peer("203.0.113.60:4021", "198.51.100.5", 21).expect("count"), 0);
}

#[rstest]
fn removing_an_absent_pid_is_a_no_op() {
    let (registry, _guard) = temp_registry();

    registry.upsert(record(300, "203.0.113.70:4021")).expect("upsert");
    registry.remove(999).expect("remove absent pid");

    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 1);
}

#[rstest]
fn count_from_peer_only_matches_the_same_peer_and_vhost() {
    let (registry, _guard) = temp_registry();

    registry.upsert(record(400, "203.0.113.80:4021")).expect("upsert");
    registry
        .upsert(SessionRecord {
            pid: 401,
            server_ip: "198.51.100.5".to_owned(),
            server_port: 990,
            user: None,
            peer_addr: "203.0.113.80:4021".to_owned(),
        })
        .expect("upsert on a different port");

    assert_eq!(registry.count_from_peer("203.0.113.80:4021", "198.51.100.5", 21).expect("count"), 1);
    assert_eq!(registry.count_from_peer("203.0.113.80:4021", "198.51.100.5", 990).expect("count"), 1);
    assert_eq!(registry.count_from_peer("203.0.113.81:4021", "198.51.100.5", 21).expect("count"), 0);
}

#[rstest]
fn multiple_pids_on_the_same_vhost_all_count() {
    let (registry, _guard) = temp_registry();

    for pid in 500..505u32 {
        registry.upsert(record(pid, "203.0.113.90:4021")).expect("upsert");
    }

    assert_eq!(registry.count_on_vhost("198.51.100.5", 21).expect("count"), 5);
}
