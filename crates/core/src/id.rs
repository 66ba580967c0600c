//! Strongly-typed identifiers used across the directory.
//!
//! Identifiers are opaque strings. Tenants are usually human-chosen names,
//! users and groups default to UUIDv7 strings.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Separator between a tenant id and the entity kind in storage keys.
///
/// Identifiers must never contain it, otherwise a partition key could not be
/// split back into its tenant.
pub const TYPE_SEPARATOR: char = ':';

/// Identifier of a tenant (client); the multi-tenant isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

/// Identifier of a user, unique within its tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of a group, unique within its tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

fn validate(value: &str, name: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_id(format!("{name}: must not be empty")));
    }
    if value.contains(TYPE_SEPARATOR) {
        return Err(DomainError::invalid_id(format!(
            "{name}: must not contain '{TYPE_SEPARATOR}'"
        )));
    }
    Ok(())
}

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create an identifier from an explicit value.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                validate(&value, $name)?;
                Ok(Self(value))
            }

            /// Generate a fresh identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_id!(TenantId, "TenantId");
impl_string_id!(UserId, "UserId");
impl_string_id!(GroupId, "GroupId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_separator() {
        assert!(TenantId::new("").is_err());
        assert!(TenantId::new("   ").is_err());
        assert!(UserId::new("a:b").is_err());
        assert_eq!(GroupId::new("admins").unwrap().as_str(), "admins");
    }

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
        assert!(UserId::new(a.to_string()).is_ok());
    }

    #[test]
    fn parses_from_str() {
        let tenant: TenantId = "acme".parse().unwrap();
        assert_eq!(tenant.to_string(), "acme");
        assert!("acme:user".parse::<TenantId>().is_err());
    }
}
