//! Configuration types for the role store

use crate::error::{Result, StoreError};
use crate::normalize::{ArnNormalizer, RoleNormalizer, VerbatimNormalizer};
use crate::pattern::PatternSyntax;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// What to do when a tenant pattern fails to compile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPatternPolicy {
    /// Log the pattern and skip it; the grant is not applied
    #[default]
    Drop,
    /// Return the compile error to the caller
    Reject,
}

/// Role store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Role handed out to addresses without an assignment.
    /// Always permitted regardless of tenant policy.
    pub default_role: Option<String>,

    /// Enforce tenant pattern restrictions
    pub tenant_restriction: bool,

    /// Base ARN prefixed onto bare role names
    /// (e.g. `arn:aws:iam::123456789012:role/`)
    pub base_arn: Option<String>,

    /// Syntax of tenant role patterns
    pub pattern_syntax: PatternSyntax,

    /// Handling of patterns that fail to compile
    pub invalid_patterns: InvalidPatternPolicy,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON or YAML file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            other => Err(StoreError::Config(format!(
                "Unsupported config file extension '{}' for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    pub fn with_tenant_restriction(mut self, enabled: bool) -> Self {
        self.tenant_restriction = enabled;
        self
    }

    pub fn with_base_arn(mut self, base_arn: impl Into<String>) -> Self {
        self.base_arn = Some(base_arn.into());
        self
    }

    pub fn with_pattern_syntax(mut self, syntax: PatternSyntax) -> Self {
        self.pattern_syntax = syntax;
        self
    }

    pub fn with_invalid_patterns(mut self, policy: InvalidPatternPolicy) -> Self {
        self.invalid_patterns = policy;
        self
    }

    /// Default role, treating an empty string as unset
    pub fn default_role(&self) -> Option<&str> {
        self.default_role.as_deref().filter(|r| !r.is_empty())
    }

    /// Normalizer matching this configuration
    pub fn normalizer(&self) -> Arc<dyn RoleNormalizer> {
        match self.base_arn.as_deref() {
            Some(base) if !base.is_empty() => Arc::new(ArnNormalizer::new(base)),
            _ => Arc::new(VerbatimNormalizer),
        }
    }
}
