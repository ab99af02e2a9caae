//! Role name normalization
//!
//! Roles can be expressed either as bare names (`payments-writer`) or as fully
//! qualified identifiers (`arn:aws:iam::123456789012:role/payments-writer`).
//! Everything stored or compared by the role store goes through a
//! [`RoleNormalizer`] first so that string matching is consistent.

use std::fmt::Debug;

/// Canonicalizes role names into fully-qualified identifiers.
///
/// Implementations must be total and idempotent:
/// `normalize(&normalize(x)) == normalize(x)`.
pub trait RoleNormalizer: Debug + Send + Sync {
    fn normalize(&self, name: &str) -> String;
}

/// Prefixes bare role names with a base ARN
#[derive(Debug, Clone)]
pub struct ArnNormalizer {
    base_arn: String,
}

impl ArnNormalizer {
    /// Create a normalizer for the given base ARN
    /// (e.g. `arn:aws:iam::123456789012:role/`)
    pub fn new(base_arn: impl Into<String>) -> Self {
        Self {
            base_arn: base_arn.into(),
        }
    }

    pub fn base_arn(&self) -> &str {
        &self.base_arn
    }
}

impl RoleNormalizer for ArnNormalizer {
    fn normalize(&self, name: &str) -> String {
        if is_arn(name) {
            return name.to_string();
        }
        format!("{}{}", self.base_arn, name)
    }
}

/// Returns names unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimNormalizer;

impl RoleNormalizer for VerbatimNormalizer {
    fn normalize(&self, name: &str) -> String {
        name.to_string()
    }
}

fn is_arn(name: &str) -> bool {
    name.get(..4)
        .map(|prefix| prefix.eq_ignore_ascii_case("arn:"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "arn:aws:iam::123456789012:role/";

    #[test]
    fn test_bare_name_gets_prefix() {
        let normalizer = ArnNormalizer::new(BASE);
        assert_eq!(
            normalizer.normalize("payments-writer"),
            "arn:aws:iam::123456789012:role/payments-writer"
        );
    }

    #[test]
    fn test_arn_passes_through() {
        let normalizer = ArnNormalizer::new(BASE);
        let arn = "arn:aws:iam::999999999999:role/other";
        assert_eq!(normalizer.normalize(arn), arn);

        // Prefix check ignores case
        let upper = "ARN:aws:iam::999999999999:role/other";
        assert_eq!(normalizer.normalize(upper), upper);
    }

    #[test]
    fn test_idempotent() {
        let normalizer = ArnNormalizer::new(BASE);
        for name in ["writer", "team/reader", "arn:aws:iam::1:role/x", "", "ar"] {
            let once = normalizer.normalize(name);
            assert_eq!(normalizer.normalize(&once), once);
        }
    }

    #[test]
    fn test_regex_pattern_is_prefixed() {
        let normalizer = ArnNormalizer::new(BASE);
        assert_eq!(
            normalizer.normalize("payments-.*"),
            "arn:aws:iam::123456789012:role/payments-.*"
        );
    }

    #[test]
    fn test_verbatim() {
        assert_eq!(VerbatimNormalizer.normalize("role:default"), "role:default");
    }
}
