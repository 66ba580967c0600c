use tracing::info;

use warden_core::{Entity, GroupId, TenantId};

use crate::directory::Repository;
use crate::error::AuthResult;
use crate::record::EntityKind;
use crate::{Group, Permission};

use super::not_found;

#[derive(Debug, Clone)]
pub struct NewGroup {
    /// Generated when absent.
    pub id: Option<GroupId>,
    pub name: String,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone)]
pub struct GroupUpdate {
    pub name: String,
    /// Replaces the stored permission list.
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone)]
pub struct GroupService {
    repository: Repository,
}

impl GroupService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create(&self, tenant_id: &TenantId, new_group: NewGroup) -> AuthResult<Group> {
        let group = Group::new(
            tenant_id.clone(),
            new_group.id.unwrap_or_else(GroupId::generate),
            new_group.name,
            new_group.permissions,
        );
        self.repository.insert(&group).await?;
        info!(
            tenant_id = %tenant_id,
            group_id = %group.id(),
            permissions = group.permissions.len(),
            "group created"
        );
        Ok(group)
    }

    pub async fn get(&self, tenant_id: &TenantId, group_id: &GroupId) -> AuthResult<Group> {
        self.repository
            .get::<Group>(tenant_id, group_id)
            .await?
            .ok_or_else(|| not_found(tenant_id, EntityKind::Group, group_id.as_str()))
    }

    pub async fn list(&self, tenant_id: &TenantId) -> AuthResult<Vec<Group>> {
        Ok(self.repository.list::<Group>(tenant_id).await?)
    }

    pub async fn update(
        &self,
        tenant_id: &TenantId,
        group_id: &GroupId,
        update: GroupUpdate,
    ) -> AuthResult<Group> {
        let group = Group::new(tenant_id.clone(), group_id.clone(), update.name, update.permissions);
        self.repository.replace(&group).await?;
        info!(tenant_id = %tenant_id, group_id = %group_id, "group updated");
        Ok(group)
    }

    /// Users still referencing the group fail resolution afterwards.
    pub async fn delete(&self, tenant_id: &TenantId, group_id: &GroupId) -> AuthResult<()> {
        self.repository.delete::<Group>(tenant_id, group_id).await?;
        info!(tenant_id = %tenant_id, group_id = %group_id, "group deleted");
        Ok(())
    }
}
