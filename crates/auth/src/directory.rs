//! Directory boundary: tenant-partitioned storage of users, groups and clients.
//!
//! The `Directory` trait is the raw key/value contract a storage adapter
//! implements. `Repository` layers typed access and group resolution on top.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use warden_core::{Entity, TenantId};

use crate::error::{AuthError, AuthResult};
use crate::record::{EntityKind, Record, RecordKey, StorageRecord};
use crate::{Group, ResolvedUser, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("record not found: {0}")]
    NotFound(String),

    /// A stored record could not be decoded into its entity.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("directory backend failure: {0}")]
    Backend(String),
}

/// Storage contract for the directory table.
///
/// Every call is scoped by a partition key that embeds the tenant; there is no
/// operation that reads across tenants.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get(&self, key: &RecordKey) -> Result<Option<StorageRecord>, DirectoryError>;

    /// Records of one kind within a tenant whose attribute `property` equals `value`.
    async fn find_by_property(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
        property: &str,
        value: &Value,
    ) -> Result<Vec<StorageRecord>, DirectoryError>;

    async fn list(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
    ) -> Result<Vec<StorageRecord>, DirectoryError>;

    /// Fails with `AlreadyExists` when the key is taken.
    async fn insert(&self, record: StorageRecord) -> Result<(), DirectoryError>;

    /// Fails with `NotFound` when the key is absent.
    async fn replace(&self, record: StorageRecord) -> Result<(), DirectoryError>;

    /// Fails with `NotFound` when the key is absent.
    async fn delete(&self, key: &RecordKey) -> Result<(), DirectoryError>;
}

#[async_trait]
impl<D> Directory for Arc<D>
where
    D: Directory + ?Sized,
{
    async fn get(&self, key: &RecordKey) -> Result<Option<StorageRecord>, DirectoryError> {
        (**self).get(key).await
    }

    async fn find_by_property(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
        property: &str,
        value: &Value,
    ) -> Result<Vec<StorageRecord>, DirectoryError> {
        (**self).find_by_property(tenant_id, kind, property, value).await
    }

    async fn list(
        &self,
        tenant_id: &TenantId,
        kind: EntityKind,
    ) -> Result<Vec<StorageRecord>, DirectoryError> {
        (**self).list(tenant_id, kind).await
    }

    async fn insert(&self, record: StorageRecord) -> Result<(), DirectoryError> {
        (**self).insert(record).await
    }

    async fn replace(&self, record: StorageRecord) -> Result<(), DirectoryError> {
        (**self).replace(record).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), DirectoryError> {
        (**self).delete(key).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository
// ─────────────────────────────────────────────────────────────────────────────

/// Typed access to the directory.
#[derive(Clone)]
pub struct Repository {
    directory: Arc<dyn Directory>,
}

impl core::fmt::Debug for Repository {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    pub async fn get<R: Record>(
        &self,
        tenant_id: &TenantId,
        id: &R::Id,
    ) -> Result<Option<R>, DirectoryError> {
        let key = RecordKey::new(tenant_id, R::KIND, id.as_ref());
        match self.directory.get(&key).await? {
            Some(record) => Ok(Some(R::from_storage_record(record)?)),
            None => Ok(None),
        }
    }

    pub async fn list<R: Record>(&self, tenant_id: &TenantId) -> Result<Vec<R>, DirectoryError> {
        self.directory
            .list(tenant_id, R::KIND)
            .await?
            .into_iter()
            .map(R::from_storage_record)
            .collect()
    }

    pub async fn insert<R: Record>(&self, entity: &R) -> Result<(), DirectoryError> {
        self.directory.insert(entity.to_storage_record()?).await
    }

    pub async fn replace<R: Record>(&self, entity: &R) -> Result<(), DirectoryError> {
        self.directory.replace(entity.to_storage_record()?).await
    }

    pub async fn delete<R: Record>(
        &self,
        tenant_id: &TenantId,
        id: &R::Id,
    ) -> Result<(), DirectoryError> {
        let key = RecordKey::new(tenant_id, R::KIND, id.as_ref());
        self.directory.delete(&key).await
    }

    /// Look a user up by username within one tenant.
    pub async fn user_by_username(
        &self,
        tenant_id: &TenantId,
        username: &str,
    ) -> Result<Option<User>, DirectoryError> {
        let matches = self
            .directory
            .find_by_property(
                tenant_id,
                EntityKind::User,
                "username",
                &Value::String(username.to_string()),
            )
            .await?;

        let mut users = matches
            .into_iter()
            .map(User::from_storage_record)
            .collect::<Result<Vec<_>, _>>()?;

        if users.len() > 1 {
            return Err(DirectoryError::Corrupt(format!(
                "username '{username}' is not unique in tenant {tenant_id}"
            )));
        }
        Ok(users.pop())
    }

    /// Attach the group objects a user references.
    ///
    /// A missing group is a data-integrity violation, never "no permissions".
    pub async fn resolve(&self, user: User) -> AuthResult<ResolvedUser> {
        let mut groups = Vec::with_capacity(user.groups.len());
        for group_id in &user.groups {
            match self.get::<Group>(user.tenant_id(), group_id).await? {
                Some(group) => groups.push(group),
                None => {
                    tracing::error!(
                        tenant_id = %user.tenant_id(),
                        user_id = %user.id(),
                        group_id = %group_id,
                        "user references a group that does not exist"
                    );
                    return Err(AuthError::inconsistency(format!(
                        "user {} references missing group {}",
                        user.id(),
                        group_id
                    )));
                }
            }
        }
        Ok(ResolvedUser::new(user, groups))
    }
}
