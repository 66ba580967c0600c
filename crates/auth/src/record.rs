//! Single-table storage records.
//!
//! Every entity is stored under a partition key `"<tenant>:<kind>"` and a sort
//! key equal to its id. The tenant and id are carried by the key only; the
//! attribute map holds everything else.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use warden_core::{Entity, TYPE_SEPARATOR, TenantId};

use crate::directory::DirectoryError;

const TENANT_ATTRIBUTE: &str = "tenantId";
const ID_ATTRIBUTE: &str = "id";

/// Kind of entity stored in the directory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Group,
    Client,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Group => "group",
            EntityKind::Client => "client",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub partition: String,
    pub sort: String,
}

impl RecordKey {
    pub fn new(tenant_id: &TenantId, kind: EntityKind, id: &str) -> Self {
        Self {
            partition: Self::partition_for(tenant_id, kind),
            sort: id.to_string(),
        }
    }

    pub fn partition_for(tenant_id: &TenantId, kind: EntityKind) -> String {
        format!("{tenant_id}{TYPE_SEPARATOR}{kind}")
    }

    /// Tenant part of the partition key (the type suffix snipped off).
    pub fn tenant(&self) -> &str {
        self.partition
            .split(TYPE_SEPARATOR)
            .next()
            .unwrap_or(&self.partition)
    }
}

impl core::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageRecord {
    pub key: RecordKey,
    pub attributes: Map<String, Value>,
}

impl StorageRecord {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Storage capability shared by users, groups and clients.
pub trait Record: Entity + Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn record_key(&self) -> RecordKey {
        RecordKey::new(self.tenant_id(), Self::KIND, self.id().as_ref())
    }

    fn to_storage_record(&self) -> Result<StorageRecord, DirectoryError> {
        let key = self.record_key();
        let mut attributes = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(DirectoryError::Corrupt(format!(
                    "{key}: expected an object, got {other}"
                )));
            }
            Err(e) => return Err(DirectoryError::Corrupt(format!("{key}: {e}"))),
        };
        attributes.remove(TENANT_ATTRIBUTE);
        attributes.remove(ID_ATTRIBUTE);
        Ok(StorageRecord { key, attributes })
    }

    fn from_storage_record(record: StorageRecord) -> Result<Self, DirectoryError> {
        let StorageRecord { key, mut attributes } = record;
        attributes.insert(TENANT_ATTRIBUTE.to_string(), Value::String(key.tenant().to_string()));
        attributes.insert(ID_ATTRIBUTE.to_string(), Value::String(key.sort.clone()));
        serde_json::from_value(Value::Object(attributes))
            .map_err(|e| DirectoryError::Corrupt(format!("{key}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_key_carries_type_suffix() {
        let tenant = TenantId::new("acme").unwrap();
        let key = RecordKey::new(&tenant, EntityKind::Group, "g1");
        assert_eq!(key.partition, "acme:group");
        assert_eq!(key.sort, "g1");
        assert_eq!(key.tenant(), "acme");
        assert_eq!(key.to_string(), "acme:group/g1");
    }
}
