//! Tenant identifiers.
//!
//! A tenant is an isolated corpus/index namespace, one per served
//! organization. Identifiers double as directory names, so they are
//! restricted to lowercase slugs.

use crate::error::RagError;

const MAX_TENANT_LEN: usize = 128;

/// Check that `tenant` is a safe slug: `[a-z0-9_-]`, 1–128 chars, not
/// starting with `-`.
pub fn validate_tenant(tenant: &str) -> Result<(), RagError> {
    let valid = !tenant.is_empty()
        && tenant.len() <= MAX_TENANT_LEN
        && !tenant.starts_with('-')
        && tenant
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RagError::InvalidTenant(tenant.to_string()))
    }
}

/// Human-readable tenant name: `seattle-central-college` → `Seattle Central College`.
pub fn display_name(tenant: &str) -> String {
    tenant
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(validate_tenant("seattle-central-college").is_ok());
        assert!(validate_tenant("new_tenant2").is_ok());
    }

    #[test]
    fn test_rejects_traversal_and_uppercase() {
        assert!(validate_tenant("").is_err());
        assert!(validate_tenant("../etc").is_err());
        assert!(validate_tenant("a/b").is_err());
        assert!(validate_tenant("School").is_err());
        assert!(validate_tenant("-flag").is_err());
        assert!(validate_tenant(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("seattle-central-college"), "Seattle Central College");
        assert_eq!(display_name("mit"), "Mit");
        assert_eq!(display_name("north__campus"), "North Campus");
    }
}
