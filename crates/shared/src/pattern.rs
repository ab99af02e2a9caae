//! Role permission patterns
//!
//! A tenant policy is a list of patterns tested against canonical role
//! identifiers. Each pattern keeps the string it was compiled from so that
//! policies can be deduplicated, revoked and dumped by that string.

use crate::error::PatternError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A compiled matcher over role identifiers
pub trait RolePattern: Debug + Send + Sync {
    /// The canonical string this pattern was compiled from
    fn source(&self) -> &str;

    /// Whether `role` is allowed by this pattern
    fn matches(&self, role: &str) -> bool;
}

/// Syntax used to compile tenant patterns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSyntax {
    /// Regular expression, matched anywhere in the role
    #[default]
    Regex,
    /// Shell-style glob over the whole role (`*`, `?`, `[...]`)
    Glob,
    /// Exact string equality
    Exact,
    /// Role must start with the pattern
    Prefix,
}

impl PatternSyntax {
    /// Compile `source` into a boxed pattern
    pub fn compile(self, source: &str) -> Result<Box<dyn RolePattern>, PatternError> {
        let pattern: Box<dyn RolePattern> = match self {
            PatternSyntax::Regex => Box::new(RegexPattern::new(source)?),
            PatternSyntax::Glob => Box::new(GlobPattern::new(source)?),
            PatternSyntax::Exact => Box::new(ExactPattern::new(source)),
            PatternSyntax::Prefix => Box::new(PrefixPattern::new(source)),
        };
        Ok(pattern)
    }
}

/// Regular expression pattern
#[derive(Debug, Clone)]
pub struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }
}

impl RolePattern for RegexPattern {
    fn source(&self) -> &str {
        self.regex.as_str()
    }

    fn matches(&self, role: &str) -> bool {
        self.regex.is_match(role)
    }
}

/// Glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: glob::Pattern,
}

impl GlobPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: glob::Pattern::new(source)?,
        })
    }
}

impl RolePattern for GlobPattern {
    fn source(&self) -> &str {
        self.pattern.as_str()
    }

    fn matches(&self, role: &str) -> bool {
        self.pattern.matches(role)
    }
}

/// Exact match pattern
#[derive(Debug, Clone)]
pub struct ExactPattern {
    role: String,
}

impl ExactPattern {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl RolePattern for ExactPattern {
    fn source(&self) -> &str {
        &self.role
    }

    fn matches(&self, role: &str) -> bool {
        self.role == role
    }
}

/// Prefix pattern
#[derive(Debug, Clone)]
pub struct PrefixPattern {
    prefix: String,
}

impl PrefixPattern {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RolePattern for PrefixPattern {
    fn source(&self) -> &str {
        &self.prefix
    }

    fn matches(&self, role: &str) -> bool {
        role.starts_with(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_is_unanchored() {
        let pattern = PatternSyntax::Regex.compile("role:payments-.*").unwrap();

        assert!(pattern.matches("role:payments-writer"));
        assert!(pattern.matches("prefix/role:payments-writer"));
        assert!(!pattern.matches("role:other-team"));
        assert_eq!(pattern.source(), "role:payments-.*");
    }

    #[test]
    fn test_regex_anchors_are_honoured() {
        let pattern = PatternSyntax::Regex.compile("^role:payments-reader$").unwrap();

        assert!(pattern.matches("role:payments-reader"));
        assert!(!pattern.matches("role:payments-reader-admin"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = PatternSyntax::Regex.compile("role:(unclosed").unwrap_err();
        assert!(matches!(err, PatternError::Regex(_)));
    }

    #[test]
    fn test_glob_matches_whole_role() {
        let pattern = PatternSyntax::Glob.compile("role:payments-*").unwrap();

        assert!(pattern.matches("role:payments-writer"));
        assert!(!pattern.matches("x/role:payments-writer"));
        assert!(!pattern.matches("role:other"));
    }

    #[test]
    fn test_invalid_glob() {
        let err = PatternSyntax::Glob.compile("role:***").unwrap_err();
        assert!(matches!(err, PatternError::Glob(_)));
    }

    #[test]
    fn test_exact_and_prefix() {
        let exact = PatternSyntax::Exact.compile("role:a").unwrap();
        assert!(exact.matches("role:a"));
        assert!(!exact.matches("role:ab"));

        let prefix = PatternSyntax::Prefix.compile("role:a").unwrap();
        assert!(prefix.matches("role:ab"));
        assert!(!prefix.matches("role:b"));
    }

    #[test]
    fn test_syntax_serde() {
        let syntax: PatternSyntax = serde_json::from_str("\"glob\"").unwrap();
        assert_eq!(syntax, PatternSyntax::Glob);
        assert_eq!(PatternSyntax::default(), PatternSyntax::Regex);
    }
}
