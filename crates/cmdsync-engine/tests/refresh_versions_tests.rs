#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{epoch, Harness};

#[test]
fn test_first_refresh_records_every_command() {
    let h = Harness::new();
    h.register("ping", "1.0.0");
    h.register("help", "1.2.0");

    let report = h.reconciler.refresh_local_versions();

    assert_eq!(report.updated, vec!["help", "ping"]);
    assert!(report.is_clean());
    let ping = h.store.get_local_version("ping").unwrap().unwrap();
    assert_eq!(ping.version, "v1.0.0");
    assert_eq!(ping.build_time, epoch());
}

#[test]
fn test_unchanged_version_keeps_build_time() {
    let h = Harness::new();
    h.register("ping", "1.0.0");
    h.reconciler.refresh_local_versions();

    h.tick();
    let report = h.reconciler.refresh_local_versions();

    assert_eq!(report.unchanged, vec!["ping"]);
    assert_eq!(
        h.store.get_local_version("ping").unwrap().unwrap().build_time,
        epoch()
    );
}

#[test]
fn test_newer_version_advances_build_time() {
    let h = Harness::new();
    h.register("ping", "1.0.0");
    h.reconciler.refresh_local_versions();

    h.tick();
    h.register("ping", "1.0.1");
    let report = h.reconciler.refresh_local_versions();

    assert_eq!(report.updated, vec!["ping"]);
    let record = h.store.get_local_version("ping").unwrap().unwrap();
    assert_eq!(record.version, "v1.0.1");
    assert!(record.build_time > epoch());
}

#[test]
fn test_downgrade_never_overwrites() {
    let h = Harness::new();
    h.register("ping", "2.0.0");
    h.reconciler.refresh_local_versions();

    h.tick();
    h.register("ping", "1.9.9");
    h.reconciler.refresh_local_versions();

    let record = h.store.get_local_version("ping").unwrap().unwrap();
    assert_eq!(record.version, "v2.0.0");
    assert_eq!(record.build_time, epoch());
}

#[test]
fn test_build_time_never_moves_backwards() {
    let h = Harness::new();
    h.register("ping", "1.0.0");
    h.clock.advance(chrono::Duration::hours(1));
    h.reconciler.refresh_local_versions();
    let first = h.store.get_local_version("ping").unwrap().unwrap().build_time;

    h.clock.set(epoch());
    h.register("ping", "1.1.0");
    h.reconciler.refresh_local_versions();

    let second = h.store.get_local_version("ping").unwrap().unwrap();
    assert_eq!(second.version, "v1.1.0");
    assert!(second.build_time >= first);
}

#[test]
fn test_invalid_declared_version_reported_and_skipped() {
    let h = Harness::new();
    h.register("ping", "1.0.0");
    h.reconciler.refresh_local_versions();

    h.register("ping", "latest");
    let report = h.reconciler.refresh_local_versions();

    assert_eq!(report.invalid, vec![("ping".to_string(), "vlatest".to_string())]);
    assert!(!report.is_clean());
    assert_eq!(h.store.get_local_version("ping").unwrap().unwrap().version, "v1.0.0");
}

#[test]
fn test_garbage_stored_version_is_replaced() {
    let h = Harness::new();
    h.store
        .put_local_version(
            "ping",
            &cmdsync_core::model::LocalVersionRecord {
                version: "not-a-version".to_string(),
                build_time: epoch(),
            },
        )
        .unwrap();
    h.register("ping", "0.0.1");

    let report = h.reconciler.refresh_local_versions();

    assert_eq!(report.updated, vec!["ping"]);
    assert_eq!(h.store.get_local_version("ping").unwrap().unwrap().version, "v0.0.1");
}

#[test]
fn test_unregistered_records_removed() {
    let h = Harness::new();
    h.register("ping", "1.0.0");
    h.register("legacy", "1.0.0");
    h.reconciler.refresh_local_versions();

    let h2 = Harness::with_store(h.store.clone());
    h2.register("ping", "1.0.0");
    let report = h2.reconciler.refresh_local_versions();

    assert_eq!(report.removed, vec!["legacy"]);
    assert_eq!(h2.store.list_local_command_names().unwrap(), vec!["ping"]);
    assert_eq!(h2.remote.mutations(), 0);
}
