//! Host lifecycle hooks
//!
//! The host calls `on_startup` once after every command is registered, then
//! `on_ready` with the tenants it is joined to, and the tenant hooks as
//! membership changes.

#![allow(clippy::result_large_err)]

use std::sync::Arc;

use crate::reconcile::{ReconcileError, ReconcileReport, Reconciler, RefreshReport};

pub type TenantOutcome = (String, std::result::Result<ReconcileReport, ReconcileError>);

#[derive(Debug, Clone)]
pub struct Lifecycle {
    reconciler: Arc<Reconciler>,
}

impl Lifecycle {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Refresh local versions; must run before any tenant is reconciled
    pub fn on_startup(&self) -> RefreshReport {
        self.reconciler.refresh_local_versions()
    }

    /// Reconcile every joined tenant, `startup_concurrency` at a time
    ///
    /// One tenant's failure never affects another. Every tenant gets an
    /// outcome, in input order; a panicked pass is reported as `Aborted`.
    pub fn on_ready(&self, tenant_ids: &[String]) -> Vec<TenantOutcome> {
        let width = self.reconciler.config().startup_concurrency.max(1);
        tracing::info!(tenants = tenant_ids.len() as u64, width = width as u64, "Syncing joined tenants");

        let mut outcomes = Vec::with_capacity(tenant_ids.len());
        for chunk in tenant_ids.chunks(width) {
            std::thread::scope(|s| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|tenant_id| {
                        let reconciler = &self.reconciler;
                        (
                            tenant_id,
                            s.spawn(move || reconciler.reconcile_tenant(tenant_id, false)),
                        )
                    })
                    .collect();

                for (tenant_id, handle) in handles {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        tracing::error!(tenant_id = %tenant_id, "Tenant sync thread panicked");
                        Err(ReconcileError::Aborted {
                            tenant_id: tenant_id.clone(),
                        })
                    });
                    outcomes.push((tenant_id.clone(), outcome));
                }
            });
        }
        outcomes
    }

    pub fn on_tenant_joined(
        &self,
        tenant_id: &str,
    ) -> std::result::Result<ReconcileReport, ReconcileError> {
        tracing::info!(tenant_id, "Joined tenant");
        self.reconciler.reconcile_tenant(tenant_id, false)
    }

    /// Nothing is cleaned up; records are overwritten if the tenant returns
    pub fn on_tenant_left(&self, tenant_id: &str) {
        tracing::info!(tenant_id, "Left tenant");
    }
}
