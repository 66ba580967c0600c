use serde::{Deserialize, Serialize};

use warden_core::{Entity, EntityRef, GroupId, TenantId};

use crate::Permission;
use crate::record::{EntityKind, Record};

/// Named bundle of permissions, owned by exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(flatten)]
    pub entity: EntityRef<GroupId>,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

impl Group {
    pub fn new(tenant_id: TenantId, id: GroupId, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            entity: EntityRef::new(tenant_id, id),
            name: name.into(),
            permissions,
        }
    }
}

impl Entity for Group {
    type Id = GroupId;

    fn id(&self) -> &GroupId {
        &self.entity.id
    }

    fn tenant_id(&self) -> &TenantId {
        &self.entity.tenant_id
    }
}

impl Record for Group {
    const KIND: EntityKind = EntityKind::Group;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_record_omits_empty_permissions() {
        let group = Group::new(
            TenantId::new("acme").unwrap(),
            GroupId::new("readers").unwrap(),
            "Readers",
            vec![],
        );
        let record = group.to_storage_record().unwrap();
        assert_eq!(record.key.partition, "acme:group");
        assert!(record.attribute("permissions").is_none());
        assert!(record.attribute("tenantId").is_none());

        let decoded = Group::from_storage_record(record).unwrap();
        assert_eq!(decoded, group);
    }

    #[test]
    fn permissions_are_stored_as_strings() {
        let group = Group::new(
            TenantId::new("acme").unwrap(),
            GroupId::new("writers").unwrap(),
            "Writers",
            crate::permissions::parse_all(["docs/*", "-docs/secret"]).unwrap(),
        );
        let record = group.to_storage_record().unwrap();
        assert_eq!(
            record.attribute("permissions").unwrap(),
            &serde_json::json!(["docs/*", "-docs/secret"])
        );
    }
}
