//! # podrole Store
//!
//! In-memory authorization cache behind the credential proxy.
//!
//! ## Components
//!
//! - `RoleStore` - Address to role mapping and tenant role restrictions
//! - `WorkloadEvent` / `TenantEvent` - Lifecycle events applied to the store
//! - `StoreStats` - Fallback, denial and dropped-pattern counters

pub mod role_store;
pub mod events;
mod stats;

pub use role_store::{
    GrantOutcome, ResolutionSource, RoleResolution, RoleStore, StoreSnapshot, TenantDecision,
};
pub use events::{parse_allowed_roles, Tenant, TenantEvent, Workload, WorkloadEvent};
pub use stats::StoreStats;
