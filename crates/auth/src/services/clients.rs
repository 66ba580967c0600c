use tracing::info;

use warden_core::{DomainError, TenantId, UserId};

use crate::directory::Repository;
use crate::error::AuthResult;
use crate::record::EntityKind;
use crate::{Client, User};

use super::not_found;

#[derive(Debug, Clone)]
pub struct ClientService {
    repository: Repository,
}

impl ClientService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a tenant with its initial admins.
    pub async fn register(&self, tenant_id: &TenantId, admins: Vec<UserId>) -> AuthResult<Client> {
        let client = Client::new(tenant_id.clone(), admins)?;
        self.repository.insert(&client).await?;
        info!(tenant_id = %tenant_id, admins = client.admin_users().len(), "tenant registered");
        Ok(client)
    }

    pub async fn get(&self, tenant_id: &TenantId) -> AuthResult<Client> {
        self.repository
            .get::<Client>(tenant_id, tenant_id)
            .await?
            .ok_or_else(|| not_found(tenant_id, EntityKind::Client, tenant_id.as_str()))
    }

    /// Append an existing user of the tenant to its admin list.
    ///
    /// Adding a user who already is an admin changes nothing.
    pub async fn add_admin(&self, tenant_id: &TenantId, user_id: UserId) -> AuthResult<Client> {
        if self.repository.get::<User>(tenant_id, &user_id).await?.is_none() {
            return Err(DomainError::validation(format!("unknown user {user_id}")).into());
        }

        let mut client = self.get(tenant_id).await?;
        if client.add_admin(user_id.clone()) {
            self.repository.replace(&client).await?;
            info!(tenant_id = %tenant_id, user_id = %user_id, "tenant admin added");
        }
        Ok(client)
    }
}
