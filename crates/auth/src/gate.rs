//! Authorization gate: guards that run a callback only for a permitted caller.
//!
//! Every guard verifies through [`TokenManager`]; none of them checks a
//! signature on its own.

use std::future::Future;

use tracing::warn;

use warden_core::{Entity, TenantId, UserId};

use crate::error::{AuthError, AuthResult, TokenError};
use crate::token::TokenManager;
use crate::{Permission, ResolvedUser, User};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let token = header
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(TokenError::Missing)?;

    if token.is_empty() {
        return Err(TokenError::Missing.into());
    }
    Ok(token)
}

#[derive(Debug, Clone)]
pub struct Gate {
    tokens: TokenManager,
}

impl Gate {
    pub fn new(tokens: TokenManager) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// The caller, if it is an administrator of `tenant_id`.
    ///
    /// Admins of other tenants are rejected.
    pub async fn tenant_admin(&self, tenant_id: &TenantId, token: &str) -> AuthResult<User> {
        let user = self.tokens.authenticate(token).await?;
        if user.is_admin && user.tenant_id() == tenant_id {
            return Ok(user);
        }
        warn!(
            tenant_id = %tenant_id,
            caller_tenant = %user.tenant_id(),
            user_id = %user.id(),
            "tenant admin required"
        );
        Err(AuthError::forbidden(format!("tenant admin of {tenant_id} required")))
    }

    /// The caller, if it administers `tenant_id` or is `subject` in that tenant.
    pub async fn tenant_admin_or_self(
        &self,
        tenant_id: &TenantId,
        token: &str,
        subject: &UserId,
    ) -> AuthResult<User> {
        let user = self.tokens.authenticate(token).await?;
        let same_tenant = user.tenant_id() == tenant_id;
        if same_tenant && (user.is_admin || user.id() == subject) {
            return Ok(user);
        }
        warn!(
            tenant_id = %tenant_id,
            caller_tenant = %user.tenant_id(),
            user_id = %user.id(),
            subject = %subject,
            "tenant admin or self required"
        );
        Err(AuthError::forbidden(format!(
            "tenant admin of {tenant_id} or user {subject} required"
        )))
    }

    /// The caller's resolved session, if its groups grant all of `required`.
    pub async fn permitted(&self, token: &str, required: &[Permission]) -> AuthResult<ResolvedUser> {
        let session = self.tokens.session(token).await?;
        let decision = session.policy().explain(required);
        if decision.granted {
            return Ok(session);
        }

        let mut missing = decision.uncovered;
        missing.extend(decision.denied.into_iter().map(|denial| denial.required));
        warn!(
            tenant_id = %session.user().tenant_id(),
            user_id = %session.user().id(),
            missing = ?missing,
            "permission denied"
        );
        Err(AuthError::forbidden(format!("missing permissions: {}", missing.join(", "))))
    }

    pub async fn require_tenant_admin<F, Fut, T>(
        &self,
        tenant_id: &TenantId,
        token: &str,
        f: F,
    ) -> AuthResult<T>
    where
        F: FnOnce(User) -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        let caller = self.tenant_admin(tenant_id, token).await?;
        f(caller).await
    }

    pub async fn require_tenant_admin_or_self<F, Fut, T>(
        &self,
        tenant_id: &TenantId,
        token: &str,
        subject: &UserId,
        f: F,
    ) -> AuthResult<T>
    where
        F: FnOnce(User) -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        let caller = self.tenant_admin_or_self(tenant_id, token, subject).await?;
        f(caller).await
    }

    pub async fn require_permissions<F, Fut, T>(
        &self,
        token: &str,
        required: &[Permission],
        f: F,
    ) -> AuthResult<T>
    where
        F: FnOnce(ResolvedUser) -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        let session = self.permitted(token, required).await?;
        f(session).await
    }
}
