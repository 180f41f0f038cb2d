//! SQLite-backed `VersionStore`
//!
//! One connection behind a mutex. Every trait method is a single statement,
//! which gives the per-call atomicity the engine relies on. Timestamps are
//! stored as unix milliseconds.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use cmdsync_core::model::{LocalVersionRecord, SettingScope, TenantVersionRecord};
use cmdsync_core::store::VersionStore;

use crate::db;
use crate::errors::{from_rusqlite, timestamp_error, Result};
use crate::migrations::apply_migrations;

pub struct SqliteVersionStore {
    conn: Mutex<Connection>,
}

impl SqliteVersionStore {
    /// Open (or create) a database file, configure it and run migrations
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = db::open(path)?;
        db::configure(&conn)?;
        tracing::debug!(path = %path.display(), "Opened version store");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    /// Wrap an existing connection, applying pending migrations
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl std::fmt::Debug for SqliteVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVersionStore").finish_non_exhaustive()
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(column: &str, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| timestamp_error(column, millis))
}

impl VersionStore for SqliteVersionStore {
    fn get_local_version(&self, command_name: &str) -> Result<Option<LocalVersionRecord>> {
        let row: Option<(String, i64)> = self
            .conn
            .lock()
            .query_row(
                "SELECT version, build_time FROM local_command_versions WHERE command_name = ?1",
                [command_name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;

        row.map(|(version, millis)| {
            Ok(LocalVersionRecord {
                version,
                build_time: from_millis("build_time", millis)?,
            })
        })
        .transpose()
    }

    fn put_local_version(&self, command_name: &str, record: &LocalVersionRecord) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO local_command_versions (command_name, version, build_time)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(command_name) DO UPDATE SET
                    version = excluded.version,
                    build_time = excluded.build_time",
                params![command_name, record.version, to_millis(record.build_time)],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn list_local_command_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT command_name FROM local_command_versions ORDER BY command_name")
            .map_err(from_rusqlite)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(names)
    }

    fn delete_local_version(&self, command_name: &str) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "DELETE FROM local_command_versions WHERE command_name = ?1",
                [command_name],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn get_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let millis: Option<i64> = self
            .conn
            .lock()
            .query_row(
                "SELECT last_applied_time FROM tenant_command_versions
                 WHERE tenant_id = ?1 AND command_name = ?2",
                [tenant_id, command_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        millis
            .map(|m| from_millis("last_applied_time", m))
            .transpose()
    }

    fn put_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO tenant_command_versions (tenant_id, command_name, last_applied_time)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(tenant_id, command_name) DO UPDATE SET
                    last_applied_time = excluded.last_applied_time",
                params![tenant_id, command_name, to_millis(applied_at)],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn delete_tenant_version(&self, tenant_id: &str, command_name: &str) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "DELETE FROM tenant_command_versions WHERE tenant_id = ?1 AND command_name = ?2",
                [tenant_id, command_name],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn list_tenant_versions(&self, tenant_id: &str) -> Result<Vec<TenantVersionRecord>> {
        let rows: Vec<(String, i64)> = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT command_name, last_applied_time FROM tenant_command_versions
                     WHERE tenant_id = ?1 ORDER BY command_name",
                )
                .map_err(from_rusqlite)?;
            let rows = stmt
                .query_map([tenant_id], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            rows
        };

        rows.into_iter()
            .map(|(command_name, millis)| {
                Ok(TenantVersionRecord {
                    tenant_id: tenant_id.to_string(),
                    command_name,
                    last_applied_time: from_millis("last_applied_time", millis)?,
                })
            })
            .collect()
    }

    fn get_setting(
        &self,
        scope: SettingScope,
        target_id: &str,
        key: &str,
    ) -> Result<Option<String>> {
        self.conn
            .lock()
            .query_row(
                "SELECT value FROM settings WHERE scope = ?1 AND target_id = ?2 AND key = ?3",
                [scope.as_str(), target_id, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)
    }

    fn set_setting(
        &self,
        scope: SettingScope,
        target_id: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO settings (scope, target_id, key, value) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scope, target_id, key) DO UPDATE SET value = excluded.value",
                [scope.as_str(), target_id, key, value],
            )
            .map_err(from_rusqlite)?;
        Ok(())
    }
}
