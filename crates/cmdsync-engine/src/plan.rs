//! Pure planning step of a tenant reconcile
//!
//! Given the desired commands (with their local and tenant version records
//! already read) and the remote snapshot, decide what to delete and what to
//! create, update or skip. No I/O happens here.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use cmdsync_core::model::{CommandSchema, LocalVersionRecord, RemoteCommand};

/// One registered command with the state read for it
#[derive(Debug, Clone)]
pub struct DesiredCommand {
    /// Lower-cased registry key
    pub name: String,
    pub schema: CommandSchema,
    pub local: Option<LocalVersionRecord>,
    /// `None` when absent or when the read failed
    pub tenant_applied: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    Update { remote_id: String },
    Skip,
    /// No local version record; cannot be propagated
    Unversioned,
}

#[derive(Debug, Clone)]
pub struct PlannedCommand {
    pub name: String,
    pub schema: CommandSchema,
    pub action: PlannedAction,
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Remote commands with no desired counterpart
    pub deletions: Vec<RemoteCommand>,
    /// One entry per desired command, ordered by name
    pub commands: Vec<PlannedCommand>,
}

impl SyncPlan {
    /// Remote mutations this plan would perform
    pub fn mutation_count(&self) -> usize {
        self.deletions.len()
            + self
                .commands
                .iter()
                .filter(|c| matches!(c.action, PlannedAction::Create | PlannedAction::Update { .. }))
                .count()
    }

    pub fn action_for(&self, name: &str) -> Option<&PlannedAction> {
        self.commands
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.action)
    }
}

/// Whether a command must be pushed to the tenant
pub fn needs_update(
    force: bool,
    local: &LocalVersionRecord,
    tenant_applied: Option<DateTime<Utc>>,
) -> bool {
    match tenant_applied {
        _ if force => true,
        None => true,
        Some(applied) => local.build_time > applied,
    }
}

/// Classify every remote and desired command
///
/// Names are compared case-insensitively. When the remote snapshot holds
/// duplicates of one name, the first is updated and the rest are deleted.
pub fn build_plan(desired: &[DesiredCommand], remote: &[RemoteCommand], force: bool) -> SyncPlan {
    let desired_names: BTreeSet<String> = desired.iter().map(|d| d.name.to_lowercase()).collect();

    let mut remote_by_name: BTreeMap<String, &RemoteCommand> = BTreeMap::new();
    let mut deletions = Vec::new();
    for cmd in remote {
        let key = cmd.name.to_lowercase();
        if !desired_names.contains(&key) || remote_by_name.contains_key(&key) {
            deletions.push(cmd.clone());
        } else {
            remote_by_name.insert(key, cmd);
        }
    }

    let mut commands: Vec<PlannedCommand> = desired
        .iter()
        .map(|d| {
            let action = match &d.local {
                None => PlannedAction::Unversioned,
                Some(local) if !needs_update(force, local, d.tenant_applied) => PlannedAction::Skip,
                Some(_) => match remote_by_name.get(&d.name.to_lowercase()) {
                    Some(existing) => PlannedAction::Update {
                        remote_id: existing.remote_id.clone(),
                    },
                    None => PlannedAction::Create,
                },
            };
            PlannedCommand {
                name: d.name.clone(),
                schema: d.schema.clone(),
                action,
            }
        })
        .collect();
    commands.sort_by(|a, b| a.name.cmp(&b.name));

    SyncPlan {
        deletions,
        commands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn desired(name: &str, built: Option<i64>, applied: Option<i64>) -> DesiredCommand {
        DesiredCommand {
            name: name.to_string(),
            schema: CommandSchema::new(name, "d"),
            local: built.map(|b| LocalVersionRecord {
                version: "v1.0.0".to_string(),
                build_time: at(b),
            }),
            tenant_applied: applied.map(at),
        }
    }

    fn remote(id: &str, name: &str) -> RemoteCommand {
        RemoteCommand {
            remote_id: id.to_string(),
            name: name.to_string(),
            schema: CommandSchema::new(name, "r"),
        }
    }

    #[test]
    fn test_fresh_tenant_creates_everything() {
        let plan = build_plan(&[desired("ping", Some(1), None), desired("help", Some(1), None)], &[], false);
        assert_eq!(plan.action_for("ping"), Some(&PlannedAction::Create));
        assert_eq!(plan.action_for("help"), Some(&PlannedAction::Create));
        assert_eq!(plan.mutation_count(), 2);
    }

    #[test]
    fn test_up_to_date_is_skipped() {
        let plan = build_plan(&[desired("ping", Some(10), Some(10))], &[remote("1", "ping")], false);
        assert_eq!(plan.action_for("ping"), Some(&PlannedAction::Skip));
        assert_eq!(plan.mutation_count(), 0);
    }

    #[test]
    fn test_newer_build_updates_existing_remote() {
        let plan = build_plan(&[desired("ping", Some(20), Some(10))], &[remote("r9", "Ping")], false);
        assert_eq!(
            plan.action_for("ping"),
            Some(&PlannedAction::Update {
                remote_id: "r9".to_string()
            })
        );
        assert!(plan.deletions.is_empty());
    }

    #[test]
    fn test_force_ignores_timestamps() {
        let plan = build_plan(&[desired("ping", Some(1), Some(100))], &[], true);
        assert_eq!(plan.action_for("ping"), Some(&PlannedAction::Create));
    }

    #[test]
    fn test_missing_local_version_is_unversioned() {
        let plan = build_plan(&[desired("ping", None, None)], &[], true);
        assert_eq!(plan.action_for("ping"), Some(&PlannedAction::Unversioned));
        assert_eq!(plan.mutation_count(), 0);
    }

    #[test]
    fn test_obsolete_and_duplicate_remote_commands_deleted() {
        let plan = build_plan(
            &[desired("ping", Some(1), Some(1))],
            &[remote("1", "ping"), remote("2", "ping"), remote("3", "old")],
            false,
        );
        let ids: Vec<_> = plan.deletions.iter().map(|r| r.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_commands_ordered_by_name() {
        let plan = build_plan(
            &[desired("zeta", Some(1), None), desired("alpha", Some(1), None)],
            &[],
            false,
        );
        let names: Vec<_> = plan.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Once every command is applied at or after its build time, a
            /// non-forced plan mutates nothing besides obsolete deletions
            #[test]
            fn applied_state_is_a_fixed_point(builds in proptest::collection::vec(0i64..1000, 1..8), lag in 0i64..100) {
                let desired: Vec<_> = builds
                    .iter()
                    .enumerate()
                    .map(|(i, b)| desired(&format!("cmd{}", i), Some(*b), Some(*b + lag)))
                    .collect();
                let remote: Vec<_> = (0..builds.len())
                    .map(|i| remote(&i.to_string(), &format!("cmd{}", i)))
                    .collect();
                let plan = build_plan(&desired, &remote, false);
                prop_assert_eq!(plan.mutation_count(), 0);
            }

            #[test]
            fn force_touches_every_versioned_command(builds in proptest::collection::vec(0i64..1000, 0..8)) {
                let desired: Vec<_> = builds
                    .iter()
                    .enumerate()
                    .map(|(i, b)| desired(&format!("cmd{}", i), Some(*b), Some(*b)))
                    .collect();
                let plan = build_plan(&desired, &[], true);
                prop_assert_eq!(plan.mutation_count(), builds.len());
            }
        }
    }
}
