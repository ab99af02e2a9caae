//! # podrole Shared
//!
//! Common types used by the role store and its collaborators.

pub mod error;
pub mod normalize;
pub mod pattern;
pub mod config;

// Re-exports
pub use error::*;
pub use normalize::*;
pub use pattern::*;
pub use config::*;
