use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use warden_auth::{Directory, DirectoryError, EntityKind, RecordKey, StorageRecord};
use warden_core::TenantId;

type Attributes = Map<String, Value>;

/// In-memory single-table directory for tests/dev.
///
/// Records are keyed by (partition, sort); the partition embeds the tenant, so
/// every lookup is tenant-isolated by construction. Conditional writes happen
/// under one write lock.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<BTreeMap<RecordKey, Attributes>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn partition_records(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
        mut keep: impl FnMut(&Attributes) -> bool,
    ) -> Result<Vec<StorageRecord>, DirectoryError> {
        let partition = RecordKey::partition_for(tenant_id, kind);
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .iter()
            .filter(|(key, attributes)| key.partition == partition && keep(attributes))
            .map(|(key, attributes)| StorageRecord {
                key: key.clone(),
                attributes: attributes.clone(),
            })
            .collect())
    }
}

fn poisoned() -> DirectoryError {
    DirectoryError::Backend("directory lock poisoned".to_string())
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get(&self, key: &RecordKey) -> Result<Option<StorageRecord>, DirectoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).map(|attributes| StorageRecord {
            key: key.clone(),
            attributes: attributes.clone(),
        }))
    }

    async fn find_by_property(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
        property: &str,
        value: &Value,
    ) -> Result<Vec<StorageRecord>, DirectoryError> {
        self.partition_records(tenant_id, kind, |attributes| {
            attributes.get(property) == Some(value)
        })
    }

    async fn list(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
    ) -> Result<Vec<StorageRecord>, DirectoryError> {
        self.partition_records(tenant_id, kind, |_| true)
    }

    async fn insert(&self, record: StorageRecord) -> Result<(), DirectoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&record.key) {
            return Err(DirectoryError::AlreadyExists(record.key.to_string()));
        }
        map.insert(record.key, record.attributes);
        Ok(())
    }

    async fn replace(&self, record: StorageRecord) -> Result<(), DirectoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&record.key) {
            Some(attributes) => {
                *attributes = record.attributes;
                Ok(())
            }
            None => Err(DirectoryError::NotFound(record.key.to_string())),
        }
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), DirectoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.remove(key) {
            Some(_) => Ok(()),
            None => Err(DirectoryError::NotFound(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(tenant: &str, kind: EntityKind, id: &str, attributes: Value) -> StorageRecord {
        let tenant = TenantId::new(tenant).unwrap();
        let Value::Object(attributes) = attributes else {
            panic!("attributes must be an object");
        };
        StorageRecord {
            key: RecordKey::new(&tenant, kind, id),
            attributes,
        }
    }

    #[tokio::test]
    async fn insert_is_conditional() {
        let dir = InMemoryDirectory::new();
        let r = record("t1", EntityKind::User, "u1", json!({"username": "alice"}));

        dir.insert(r.clone()).await.unwrap();
        let err = dir.insert(r).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists(_)));
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn replace_and_delete_require_existing_record() {
        let dir = InMemoryDirectory::new();
        let r = record("t1", EntityKind::Group, "g1", json!({"name": "readers"}));

        assert!(matches!(
            dir.replace(r.clone()).await.unwrap_err(),
            DirectoryError::NotFound(_)
        ));
        assert!(matches!(
            dir.delete(&r.key).await.unwrap_err(),
            DirectoryError::NotFound(_)
        ));

        dir.insert(r.clone()).await.unwrap();
        let updated = record("t1", EntityKind::Group, "g1", json!({"name": "writers"}));
        dir.replace(updated.clone()).await.unwrap();
        assert_eq!(dir.get(&r.key).await.unwrap(), Some(updated));

        dir.delete(&r.key).await.unwrap();
        assert!(dir.get(&r.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tenants_and_kinds_are_isolated() {
        let dir = InMemoryDirectory::new();
        dir.insert(record("t1", EntityKind::User, "u1", json!({"username": "alice"})))
            .await
            .unwrap();
        dir.insert(record("t2", EntityKind::User, "u1", json!({"username": "alice"})))
            .await
            .unwrap();
        dir.insert(record("t1", EntityKind::Group, "u1", json!({"name": "alice"})))
            .await
            .unwrap();

        let t1 = TenantId::new("t1").unwrap();
        let users = dir.list(&t1, EntityKind::User).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].key.partition, "t1:user");

        let found = dir
            .find_by_property(&t1, EntityKind::User, "username", &json!("alice"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let none = dir
            .find_by_property(&t1, EntityKind::User, "username", &json!("bob"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn poisoned_lock_still_counts_but_fails_reads() {
        let dir = std::sync::Arc::new(InMemoryDirectory::new());
        let r = record("t1", EntityKind::User, "u1", json!({"username": "alice"}));
        dir.insert(r.clone()).await.unwrap();

        let holder = dir.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert_eq!(dir.len(), 1);
        assert!(!dir.is_empty());
        assert!(matches!(
            dir.get(&r.key).await.unwrap_err(),
            DirectoryError::Backend(_)
        ));
    }
}
