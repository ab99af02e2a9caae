//! Workload and tenant events
//!
//! The event source that watches the cluster turns workload and tenant
//! changes into these events; applying them keeps the [`RoleStore`] in sync.

use crate::role_store::RoleStore;
use serde::{Deserialize, Serialize};
use shared::{Result, StoreError};
use tracing::debug;

/// A running workload as seen by the event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    /// Network address; empty until one is assigned
    pub address: String,
    pub tenant: String,
    /// Requested role, bare or fully qualified
    #[serde(default)]
    pub role: Option<String>,
}

impl Workload {
    pub fn new(address: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            tenant: tenant.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Workload lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadEvent {
    Appeared(Workload),
    Updated { previous: Workload, current: Workload },
    Removed(Workload),
}

/// A tenant and the role patterns its configuration allows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub name: String,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
}

impl Tenant {
    pub fn new(name: impl Into<String>, allowed_roles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            allowed_roles,
        }
    }

    /// Build a tenant from its allowed-roles annotation value
    pub fn from_annotation(name: impl Into<String>, annotation: &str) -> Result<Self> {
        Ok(Self::new(name, parse_allowed_roles(annotation)?))
    }
}

/// Tenant lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantEvent {
    Appeared(Tenant),
    Updated { previous: Tenant, current: Tenant },
    Removed(Tenant),
}

/// Parse an allowed-roles annotation: a JSON array of role patterns.
/// A blank annotation allows nothing.
pub fn parse_allowed_roles(annotation: &str) -> Result<Vec<String>> {
    if annotation.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(annotation).map_err(StoreError::InvalidAnnotation)
}

impl RoleStore {
    /// Apply a workload event. Role and tenant of an address change under
    /// one lock acquisition.
    pub fn apply_workload_event(&self, event: &WorkloadEvent) {
        match event {
            WorkloadEvent::Appeared(workload) => self.upsert_workload(None, workload),
            WorkloadEvent::Updated { previous, current } => {
                self.upsert_workload(Some(previous), current)
            }
            WorkloadEvent::Removed(workload) => {
                if !workload.address.is_empty() {
                    self.forget(&workload.address);
                    debug!(address = %workload.address, "Forgot workload");
                }
            }
        }
    }

    fn upsert_workload(&self, previous: Option<&Workload>, current: &Workload) {
        let role = current
            .role
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(|r| self.normalizer().normalize(r));

        let mut state = self.write();

        if let Some(previous) = previous.filter(|p| !p.address.is_empty()) {
            state.forget(&previous.address);
        }

        if current.address.is_empty() {
            debug!(tenant = %current.tenant, "Skipping workload without address");
            return;
        }

        match role {
            Some(role) => state.record_role(current.address.clone(), role),
            None => state.clear_role(&current.address),
        }
        state.record_tenant(current.address.clone(), current.tenant.clone());
        debug!(address = %current.address, tenant = %current.tenant, "Recorded workload");
    }

    /// Apply a tenant event.
    ///
    /// Every pattern is attempted; the first rejected pattern is returned
    /// after the rest have been applied.
    pub fn apply_tenant_event(&self, event: &TenantEvent) -> Result<()> {
        match event {
            TenantEvent::Appeared(tenant) => self.grant_all(tenant),
            TenantEvent::Updated { previous, current } => {
                for stale in previous
                    .allowed_roles
                    .iter()
                    .filter(|r| !current.allowed_roles.contains(r))
                {
                    self.revoke_pattern(&previous.name, stale);
                }
                self.grant_all(current)
            }
            TenantEvent::Removed(tenant) => {
                self.drop_tenant(&tenant.name);
                Ok(())
            }
        }
    }

    fn grant_all(&self, tenant: &Tenant) -> Result<()> {
        let mut first_error = None;
        for pattern in &tenant.allowed_roles {
            if let Err(err) = self.grant_pattern(&tenant.name, pattern) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
