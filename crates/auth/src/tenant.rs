//! Tenants (clients): the isolation boundary.
//!
//! Full client CRUD lives outside this crate; only what the gate and the
//! admin bootstrap need is modeled here.

use serde::{Deserialize, Serialize};

use warden_core::{DomainError, DomainResult, Entity, TenantId, UserId};

use crate::record::{EntityKind, Record};

/// A tenant record. Its entity id is the tenant id itself.
///
/// # Invariants
/// - At least one admin user at creation time.
/// - The admin list is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub tenant_id: TenantId,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    admin_users: Vec<UserId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirect_urls: Vec<String>,
}

impl Client {
    pub fn new(tenant_id: TenantId, admin_users: Vec<UserId>) -> DomainResult<Self> {
        if admin_users.is_empty() {
            return Err(DomainError::invariant("a tenant needs at least one admin user"));
        }
        let mut client = Self {
            tenant_id,
            admin_users: Vec::with_capacity(admin_users.len()),
            redirect_urls: Vec::new(),
        };
        for admin in admin_users {
            client.add_admin(admin);
        }
        Ok(client)
    }

    pub fn admin_users(&self) -> &[UserId] {
        &self.admin_users
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.admin_users.contains(user_id)
    }

    /// Append an admin. Returns `false` if the user already was one.
    pub fn add_admin(&mut self, user_id: UserId) -> bool {
        if self.is_admin(&user_id) {
            return false;
        }
        self.admin_users.push(user_id);
        true
    }
}

impl Entity for Client {
    type Id = TenantId;

    fn id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

impl Record for Client {
    const KIND: EntityKind = EntityKind::Client;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn requires_an_admin() {
        let err = Client::new(TenantId::new("acme").unwrap(), vec![]).unwrap_err();
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn admin_list_is_deduplicated_and_append_only() {
        let mut client =
            Client::new(TenantId::new("acme").unwrap(), vec![uid("a"), uid("a")]).unwrap();
        assert_eq!(client.admin_users(), [uid("a")]);
        assert!(client.add_admin(uid("b")));
        assert!(!client.add_admin(uid("b")));
        assert_eq!(client.admin_users(), [uid("a"), uid("b")]);
    }

    #[test]
    fn sort_key_equals_tenant() {
        let client = Client::new(TenantId::new("acme").unwrap(), vec![uid("a")]).unwrap();
        let record = client.to_storage_record().unwrap();
        assert_eq!(record.key.partition, "acme:client");
        assert_eq!(record.key.sort, "acme");
        assert_eq!(Client::from_storage_record(record).unwrap(), client);
    }
}
