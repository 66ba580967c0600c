use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use warden_core::{DomainError, Entity, GroupId, TenantId, UserId};

use crate::credentials::CredentialVerifier;
use crate::directory::{DirectoryError, Repository};
use crate::error::AuthResult;
use crate::record::EntityKind;
use crate::{Group, ResolvedUser, User};

use super::not_found;

#[derive(Clone)]
pub struct NewUser {
    /// Generated when absent.
    pub id: Option<UserId>,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
    pub groups: BTreeSet<GroupId>,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("is_admin", &self.is_admin)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// Replacement profile for an existing user.
///
/// `password: None` keeps the stored hash. The signing secret and MFA state
/// are never taken from here.
#[derive(Clone)]
pub struct UserUpdate {
    pub username: String,
    pub password: Option<String>,
    pub is_admin: bool,
    pub groups: BTreeSet<GroupId>,
}

impl core::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("username", &self.username)
            .field("password_changed", &self.password.is_some())
            .field("is_admin", &self.is_admin)
            .field("groups", &self.groups)
            .finish()
    }
}

#[derive(Clone)]
pub struct UserService {
    repository: Repository,
    credentials: Arc<dyn CredentialVerifier>,
}

impl UserService {
    pub fn new(repository: Repository, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            repository,
            credentials,
        }
    }

    pub async fn create(&self, tenant_id: &TenantId, new_user: NewUser) -> AuthResult<User> {
        let NewUser {
            id,
            username,
            password,
            is_admin,
            groups,
        } = new_user;

        validate_username(&username)?;
        self.ensure_username_free(tenant_id, &username, None).await?;
        self.ensure_groups_exist(tenant_id, &groups).await?;

        let password_hash = self.credentials.hash_password(&password).await?;
        let user = User::new(
            tenant_id.clone(),
            id.unwrap_or_else(UserId::generate),
            username,
            password_hash,
            is_admin,
            groups,
        );
        self.repository.insert(&user).await?;

        info!(tenant_id = %tenant_id, user_id = %user.id(), is_admin, "user created");
        Ok(user)
    }

    pub async fn get(&self, tenant_id: &TenantId, user_id: &UserId) -> AuthResult<User> {
        self.repository
            .get::<User>(tenant_id, user_id)
            .await?
            .ok_or_else(|| not_found(tenant_id, EntityKind::User, user_id.as_str()))
    }

    pub async fn resolve(&self, user: User) -> AuthResult<ResolvedUser> {
        self.repository.resolve(user).await
    }

    pub async fn list(&self, tenant_id: &TenantId) -> AuthResult<Vec<User>> {
        Ok(self.repository.list::<User>(tenant_id).await?)
    }

    /// Replace a user's profile, keeping its signing secret and MFA state.
    pub async fn update(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        update: UserUpdate,
    ) -> AuthResult<User> {
        let stored = self.get(tenant_id, user_id).await?;

        validate_username(&update.username)?;
        if update.username != stored.username {
            self.ensure_username_free(tenant_id, &update.username, Some(user_id))
                .await?;
        }
        self.ensure_groups_exist(tenant_id, &update.groups).await?;

        let password_hash = match &update.password {
            Some(password) => self.credentials.hash_password(password).await?,
            None => stored.password_hash.clone(),
        };

        let mut user = User::new(
            tenant_id.clone(),
            user_id.clone(),
            update.username,
            password_hash,
            update.is_admin,
            update.groups,
        );
        user.keep_secrets_of(&stored);
        self.repository.replace(&user).await?;

        info!(tenant_id = %tenant_id, user_id = %user_id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, tenant_id: &TenantId, user_id: &UserId) -> AuthResult<()> {
        self.repository.delete::<User>(tenant_id, user_id).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, "user deleted");
        Ok(())
    }

    async fn ensure_username_free(
        &self,
        tenant_id: &TenantId,
        username: &str,
        except: Option<&UserId>,
    ) -> AuthResult<()> {
        match self.repository.user_by_username(tenant_id, username).await? {
            Some(existing) if Some(existing.id()) != except => Err(DirectoryError::AlreadyExists(
                format!("username '{username}' in tenant {tenant_id}"),
            )
            .into()),
            _ => Ok(()),
        }
    }

    async fn ensure_groups_exist(
        &self,
        tenant_id: &TenantId,
        groups: &BTreeSet<GroupId>,
    ) -> AuthResult<()> {
        for group_id in groups {
            if self.repository.get::<Group>(tenant_id, group_id).await?.is_none() {
                return Err(DomainError::validation(format!("unknown group {group_id}")).into());
            }
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.trim().is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    Ok(())
}
