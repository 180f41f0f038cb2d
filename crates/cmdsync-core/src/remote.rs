//! Remote command API contract
//!
//! The platform's REST surface for per-tenant commands. Any call may fail
//! with a transport or authorization error; the reconciliation engine treats
//! every failure as non-fatal and reports it.

use crate::errors::Result;
use crate::model::{CommandSchema, RemoteCommand};

pub trait RemoteCommandApi: Send + Sync {
    /// Commands currently registered for `tenant_id`
    fn list(&self, tenant_id: &str) -> Result<Vec<RemoteCommand>>;

    /// Register a new command; returns the remote identifier
    fn create(&self, tenant_id: &str, schema: &CommandSchema) -> Result<String>;

    /// Overwrite an existing command in place
    fn update(&self, tenant_id: &str, remote_id: &str, schema: &CommandSchema) -> Result<()>;

    fn delete(&self, tenant_id: &str, remote_id: &str) -> Result<()>;
}
