#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use cmdsync_store::SqliteVersionStore;
use common::Harness;

#[test]
fn test_restart_with_same_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.db");

    {
        let h = Harness::with_store(Arc::new(SqliteVersionStore::open(&path).unwrap()));
        h.register("ping", "1.0.0");
        h.reconciler.refresh_local_versions();
        h.tick();
        h.reconciler.reconcile_tenant("g1", false).unwrap();
        assert_eq!(h.remote.creates(), 1);
    }

    let h = Harness::with_store(Arc::new(SqliteVersionStore::open(&path).unwrap()));
    h.register("ping", "1.0.0");
    h.remote.seed("g1", "ping");
    let refresh = h.reconciler.refresh_local_versions();
    assert_eq!(refresh.unchanged, vec!["ping"]);

    h.tick();
    let report = h.reconciler.reconcile_tenant("g1", false).unwrap();
    assert_eq!(report.skipped, vec!["ping"]);
    assert_eq!(h.remote.mutations(), 0);
}
