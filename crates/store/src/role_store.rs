//! RoleStore - Address to role mapping with tenant restrictions

use crate::stats::{DecisionCounters, StoreStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    InvalidPatternError, InvalidPatternPolicy, PatternSyntax, Result, RoleNormalizer,
    RoleNotFoundError, RolePattern, StoreConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// The three mappings, always locked together
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    roles_by_address: HashMap<String, String>,
    tenant_by_address: HashMap<String, String>,
    patterns_by_tenant: HashMap<String, Vec<Box<dyn RolePattern>>>,
}

impl StoreState {
    pub(crate) fn record_role(&mut self, address: String, role: String) {
        self.roles_by_address.insert(address, role);
    }

    pub(crate) fn clear_role(&mut self, address: &str) {
        self.roles_by_address.remove(address);
    }

    pub(crate) fn record_tenant(&mut self, address: String, tenant: String) {
        self.tenant_by_address.insert(address, tenant);
    }

    pub(crate) fn forget(&mut self, address: &str) {
        self.roles_by_address.remove(address);
        self.tenant_by_address.remove(address);
    }

    fn has_pattern(&self, tenant: &str, source: &str) -> bool {
        self.patterns_by_tenant
            .get(tenant)
            .map(|patterns| patterns.iter().any(|p| p.source() == source))
            .unwrap_or(false)
    }

    fn pattern_sources(&self) -> HashMap<String, Vec<String>> {
        self.patterns_by_tenant
            .iter()
            .map(|(tenant, patterns)| {
                let sources = patterns.iter().map(|p| p.source().to_string()).collect();
                (tenant.clone(), sources)
            })
            .collect()
    }
}

/// Where a resolved role came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Explicit assignment for the address
    Assigned,
    /// No assignment; the default role was used
    Fallback,
}

/// Result of resolving an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleResolution {
    pub role: String,
    pub source: ResolutionSource,
}

impl RoleResolution {
    pub fn is_fallback(&self) -> bool {
        self.source == ResolutionSource::Fallback
    }
}

/// Result of a tenant restriction check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantDecision {
    pub permitted: bool,
    /// Tenant of the requesting address, empty when unknown
    pub tenant: String,
}

impl TenantDecision {
    fn permitted(tenant: String) -> Self {
        Self {
            permitted: true,
            tenant,
        }
    }

    fn denied(tenant: String) -> Self {
        Self {
            permitted: false,
            tenant,
        }
    }
}

/// Outcome of granting a pattern to a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Added,
    AlreadyPresent,
    /// Pattern did not compile and was skipped
    Dropped,
}

/// Consistent copy of every mapping in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub taken_at: DateTime<Utc>,
    pub roles_by_address: HashMap<String, String>,
    pub tenants_by_address: HashMap<String, String>,
    pub patterns_by_tenant: HashMap<String, Vec<String>>,
}

/// Maps workload addresses to roles and enforces per-tenant role patterns.
///
/// Cloning yields another handle to the same store.
#[derive(Debug, Clone)]
pub struct RoleStore {
    state: Arc<RwLock<StoreState>>,
    normalizer: Arc<dyn RoleNormalizer>,
    /// Normalized default role
    default_role: Option<String>,
    tenant_restriction: bool,
    pattern_syntax: PatternSyntax,
    invalid_patterns: InvalidPatternPolicy,
    counters: Arc<DecisionCounters>,
}

impl RoleStore {
    /// Create a store using the normalizer described by `config`
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_normalizer(config, config.normalizer())
    }

    /// Create a store with an explicit normalizer
    pub fn with_normalizer(config: &StoreConfig, normalizer: Arc<dyn RoleNormalizer>) -> Self {
        let default_role = config.default_role().map(|r| normalizer.normalize(r));

        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            normalizer,
            default_role,
            tenant_restriction: config.tenant_restriction,
            pattern_syntax: config.pattern_syntax,
            invalid_patterns: config.invalid_patterns,
            counters: Arc::new(DecisionCounters::default()),
        }
    }

    /// Normalized default role, if configured
    pub fn default_role(&self) -> Option<&str> {
        self.default_role.as_deref()
    }

    pub fn tenant_restriction(&self) -> bool {
        self.tenant_restriction
    }

    pub fn normalizer(&self) -> &dyn RoleNormalizer {
        self.normalizer.as_ref()
    }

    // No operation leaves the maps half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the role for an address, falling back to the default role
    pub fn resolve(&self, address: &str) -> Result<RoleResolution> {
        if let Some(role) = self.read().roles_by_address.get(address) {
            return Ok(RoleResolution {
                role: role.clone(),
                source: ResolutionSource::Assigned,
            });
        }

        match &self.default_role {
            Some(role) => {
                warn!(address, role = %role, "Using fallback role");
                self.counters.record_fallback();
                Ok(RoleResolution {
                    role: role.clone(),
                    source: ResolutionSource::Fallback,
                })
            }
            None => Err(RoleNotFoundError {
                address: address.to_string(),
            }
            .into()),
        }
    }

    /// Assign a role to an address, replacing any previous one
    pub fn record_role(&self, address: impl Into<String>, role: impl Into<String>) {
        self.write().record_role(address.into(), role.into());
    }

    /// Record the tenant of an address, replacing any previous one
    pub fn record_tenant(&self, address: impl Into<String>, tenant: impl Into<String>) {
        self.write().record_tenant(address.into(), tenant.into());
    }

    /// Remove both the role and the tenant of an address
    pub fn forget(&self, address: &str) {
        self.write().forget(address);
    }

    /// Allow roles matching `pattern` for workloads in `tenant`
    pub fn grant_pattern(&self, tenant: &str, pattern: &str) -> Result<GrantOutcome> {
        let source = self.normalizer.normalize(pattern);

        if self.read().has_pattern(tenant, &source) {
            return Ok(GrantOutcome::AlreadyPresent);
        }

        let compiled = match self.pattern_syntax.compile(&source) {
            Ok(compiled) => compiled,
            Err(err) => {
                let err = InvalidPatternError {
                    tenant: tenant.to_string(),
                    pattern: source,
                    source: err,
                };
                return match self.invalid_patterns {
                    InvalidPatternPolicy::Drop => {
                        warn!(tenant, pattern = %err.pattern, error = %err.source, "Dropping invalid role pattern");
                        self.counters.record_dropped_pattern();
                        Ok(GrantOutcome::Dropped)
                    }
                    InvalidPatternPolicy::Reject => Err(err.into()),
                };
            }
        };

        let mut state = self.write();
        let patterns = state.patterns_by_tenant.entry(tenant.to_string()).or_default();

        // Another writer may have granted it while we compiled
        if patterns.iter().any(|p| p.source() == source) {
            return Ok(GrantOutcome::AlreadyPresent);
        }
        patterns.push(compiled);
        debug!(tenant, pattern = %source, "Granted role pattern");

        Ok(GrantOutcome::Added)
    }

    /// Remove a previously granted pattern. Returns whether one was removed.
    pub fn revoke_pattern(&self, tenant: &str, pattern: &str) -> bool {
        let source = self.normalizer.normalize(pattern);

        let mut state = self.write();
        let Some(patterns) = state.patterns_by_tenant.get_mut(tenant) else {
            return false;
        };

        match patterns.iter().position(|p| p.source() == source) {
            Some(index) => {
                patterns.remove(index);
                debug!(tenant, pattern = %source, "Revoked role pattern");
                true
            }
            None => false,
        }
    }

    /// Remove every pattern of a tenant. Returns whether the tenant was known.
    pub fn drop_tenant(&self, tenant: &str) -> bool {
        let removed = self.write().patterns_by_tenant.remove(tenant).is_some();
        if removed {
            info!(tenant, "Dropped tenant role patterns");
        }
        removed
    }

    /// Check whether `role` may be assumed by the workload at `address`.
    ///
    /// `role` must already be normalized.
    pub fn is_permitted(&self, role: &str, address: &str) -> TenantDecision {
        let state = self.read();
        let tenant = state
            .tenant_by_address
            .get(address)
            .cloned()
            .unwrap_or_default();

        if !self.tenant_restriction {
            return TenantDecision::permitted(tenant);
        }

        if self.default_role.as_deref() == Some(role) {
            return TenantDecision::permitted(tenant);
        }

        let matched = state
            .patterns_by_tenant
            .get(&tenant)
            .and_then(|patterns| patterns.iter().find(|p| p.matches(role)));

        match matched {
            Some(pattern) => {
                debug!(role, tenant = %tenant, pattern = pattern.source(), "Role matches tenant pattern");
                TenantDecision::permitted(tenant)
            }
            None => {
                warn!(role, tenant = %tenant, "Role not allowed in tenant");
                self.counters.record_denial();
                TenantDecision::denied(tenant)
            }
        }
    }

    /// Copy of the address to role mapping
    pub fn roles_by_address(&self) -> HashMap<String, String> {
        self.read().roles_by_address.clone()
    }

    /// Copy of the address to tenant mapping
    pub fn tenants_by_address(&self) -> HashMap<String, String> {
        self.read().tenant_by_address.clone()
    }

    /// Pattern strings granted to each tenant, in grant order
    pub fn patterns_by_tenant(&self) -> HashMap<String, Vec<String>> {
        self.read().pattern_sources()
    }

    /// All three mappings taken under one lock
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.read();
        StoreSnapshot {
            taken_at: Utc::now(),
            roles_by_address: state.roles_by_address.clone(),
            tenants_by_address: state.tenant_by_address.clone(),
            patterns_by_tenant: state.pattern_sources(),
        }
    }

    pub fn stats(&self) -> StoreStats {
        self.counters.snapshot()
    }
}
