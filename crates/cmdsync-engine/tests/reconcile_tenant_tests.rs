#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cmdsync_engine::ReconcileError;
use common::{FlakyStore, Harness};

fn ready(names: &[&str]) -> Harness {
    let h = Harness::new();
    for name in names {
        h.register(name, "1.0.0");
    }
    h.reconciler.refresh_local_versions();
    h
}

#[test]
fn test_fresh_tenant_gets_every_command() {
    let h = ready(&["help", "ping", "settings"]);
    h.tick();

    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.created, vec!["help", "ping", "settings"]);
    assert_eq!(h.remote.names("g1"), vec!["help", "ping", "settings"]);
    assert_eq!(h.store.list_tenant_versions("g1").unwrap().len(), 3);
}

#[test]
fn test_second_pass_is_idempotent() {
    let h = ready(&["help", "ping"]);
    h.tick();
    h.reconciler.reconcile_tenant("g1", false).unwrap();
    h.remote.reset_counters();

    h.tick();
    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(h.remote.mutations(), 0);
    assert_eq!(report.skipped, vec!["help", "ping"]);
    assert_eq!(report.succeeded(), 0);
}

#[test]
fn test_version_bump_updates_in_place() {
    let h = ready(&["help", "ping"]);
    h.tick();
    h.reconciler.reconcile_tenant("g1", false).unwrap();
    h.remote.reset_counters();

    h.tick();
    h.register("ping", "1.1.0");
    h.reconciler.refresh_local_versions();
    h.tick();
    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.updated, vec!["ping"]);
    assert_eq!(report.skipped, vec!["help"]);
    assert_eq!(h.remote.updates(), 1);
    assert_eq!(h.remote.creates(), 0);
}

#[test]
fn test_obsolete_remote_command_deleted_with_its_record() {
    let h = ready(&["ping"]);
    h.remote.seed("g1", "old");
    h.store
        .put_tenant_last_applied("g1", "old", common::epoch())
        .unwrap();
    h.tick();

    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.deleted, vec!["old"]);
    assert_eq!(h.remote.names("g1"), vec!["ping"]);
    assert!(h.store.get_tenant_last_applied("g1", "old").unwrap().is_none());
}

#[test]
fn test_failed_delete_keeps_record_and_does_not_fail_pass() {
    let h = ready(&["ping"]);
    h.remote.seed("g1", "old");
    h.store
        .put_tenant_last_applied("g1", "old", common::epoch())
        .unwrap();
    h.remote.fail_delete_of("old");
    h.tick();

    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.delete_failures.len(), 1);
    assert!(h.store.get_tenant_last_applied("g1", "old").unwrap().is_some());
}

#[test]
fn test_force_converges_to_exactly_registered_set() {
    let h = ready(&["help", "ping"]);
    h.remote.seed("g1", "ping");
    h.remote.seed("g1", "stale");
    h.remote.seed("g1", "ancient");
    h.tick();
    h.reconciler.reconcile_tenant("g1", false).unwrap();

    let report = h.reconciler.reconcile_tenant("g1", true).unwrap();

    assert_eq!(h.remote.names("g1"), vec!["help", "ping"]);
    assert_eq!(report.created, vec!["help", "ping"]);
    assert!(report.deleted.contains(&"ping".to_string()));
    let applied: Vec<_> = h
        .store
        .list_tenant_versions("g1")
        .unwrap()
        .into_iter()
        .map(|r| r.command_name)
        .collect();
    assert_eq!(applied, vec!["help", "ping"]);
}

#[test]
fn test_failed_recreate_after_force_is_restored_next_pass() {
    let h = ready(&["ping"]);
    h.tick();
    h.reconciler.reconcile_tenant("g1", false).unwrap();
    h.tick();

    h.remote.fail_apply_of("ping");
    assert!(h.reconciler.reconcile_tenant("g1", true).is_err());
    assert!(h.remote.names("g1").is_empty());
    assert!(h
        .store
        .get_tenant_last_applied("g1", "ping")
        .unwrap()
        .is_none());

    h.remote.heal();
    h.tick();
    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.created, vec!["ping"]);
    assert!(report.skipped.is_empty());
    assert_eq!(h.remote.names("g1"), vec!["ping"]);
    assert!(h
        .store
        .get_tenant_last_applied("g1", "ping")
        .unwrap()
        .is_some());
}

#[test]
fn test_partial_failure_reports_every_failed_command() {
    let h = ready(&["a", "b", "c", "d", "e"]);
    h.remote.fail_apply_of("b");
    h.remote.fail_apply_of("d");
    h.tick();

    let err = h.reconciler.reconcile_tenant("g1", false).unwrap_err();

    let report = err.report().expect("partial report");
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.failed_names(), vec!["b", "d"]);
    let message = err.to_string();
    assert!(message.contains("b: "));
    assert!(message.contains("d: "));

    let applied: Vec<_> = h
        .store
        .list_tenant_versions("g1")
        .unwrap()
        .into_iter()
        .map(|r| r.command_name)
        .collect();
    assert_eq!(applied, vec!["a", "c", "e"]);
}

#[test]
fn test_failed_commands_retried_next_pass() {
    let h = ready(&["a", "b"]);
    h.remote.fail_apply_of("b");
    h.tick();
    assert!(h.reconciler.reconcile_tenant("g1", false).is_err());

    h.remote.heal();
    h.remote.reset_counters();
    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.created, vec!["b"]);
    assert_eq!(report.skipped, vec!["a"]);
    assert_eq!(h.remote.mutations(), 1);
}

#[test]
fn test_fetch_failure_changes_nothing() {
    let h = ready(&["ping"]);
    h.remote.seed("g1", "old");
    h.remote.fail_list_for("g1");

    let err = h.reconciler.reconcile_tenant("g1", true).unwrap_err();

    assert!(matches!(err, ReconcileError::Fetch { .. }));
    assert_eq!(h.remote.mutations(), 0);
    assert!(h.store.list_tenant_versions("g1").unwrap().is_empty());
}

#[test]
fn test_unversioned_command_is_skipped_not_failed() {
    let h = ready(&["ping"]);
    h.register("late", "1.0.0");
    h.tick();

    let report = h.reconciler.reconcile_tenant("g1", true).unwrap();

    assert_eq!(report.unversioned, vec!["late"]);
    assert_eq!(h.remote.names("g1"), vec!["ping"]);
}

#[test]
fn test_tenant_read_failure_means_needs_update() {
    let store = FlakyStore::new();
    let h = Harness::with_store(store.clone());
    h.register("ping", "1.0.0");
    h.reconciler.refresh_local_versions();
    h.tick();
    h.reconciler.reconcile_tenant("g1", false).unwrap();
    h.remote.reset_counters();

    store.fail_tenant_read_of("ping");
    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();

    assert_eq!(report.updated, vec!["ping"]);
    assert_eq!(h.remote.updates(), 1);
}

#[test]
fn test_tenants_are_independent() {
    let h = ready(&["ping"]);
    h.tick();
    h.reconciler.reconcile_tenant("g1", false).unwrap();

    h.remote.reset_counters();
    let report = h.reconciler.reconcile_tenant("g2", false).unwrap();

    assert_eq!(report.created, vec!["ping"]);
    assert_eq!(h.remote.creates(), 1);
}
