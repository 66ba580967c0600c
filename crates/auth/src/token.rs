//! Token lifecycle manager.
//!
//! Tokens are HS256 JWTs signed with the subject's *current* signing secret.
//! There is no blacklist: rotating the stored secret is the only revocation,
//! and it revokes every outstanding token of that user at once.

use std::sync::Arc;

use chrono::{Duration, SubsecRound};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use warden_core::{Clock, Entity, SystemClock, TenantId, UserId};

use crate::claims::{TokenClaims, validate_claims};
use crate::credentials::{CredentialVerifier, TotpEnrollment};
use crate::directory::{DirectoryError, Repository};
use crate::error::{AuthError, AuthResult, TokenError};
use crate::record::{EntityKind, RecordKey};
use crate::{Permission, ResolvedUser, User};

pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 30;

/// Adjacent 30-second TOTP steps accepted either side of now.
pub const TOTP_WINDOW: u8 = 1;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Hashed once per manager; unknown usernames are checked against it so every
/// rejected login pays for one password verification.
const DECOY_PASSWORD: &str = "warden-decoy-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Absolute lifetime from issuance; refresh resets it, never extends it.
    pub lifetime: Duration,
    pub totp_window: u8,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
            totp_window: TOTP_WINDOW,
        }
    }
}

/// Issues, verifies, refreshes and revokes tokens; enrolls and removes MFA.
///
/// Holds no per-request state. Every call re-reads the user from the
/// directory, so group and secret changes take effect immediately.
#[derive(Clone)]
pub struct TokenManager {
    repository: Repository,
    credentials: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    settings: TokenSettings,
    decoy_hash: Arc<OnceCell<String>>,
}

impl core::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenManager")
            .field("clock", &self.clock)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(repository: Repository, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            repository,
            credentials,
            clock: Arc::new(SystemClock),
            settings: TokenSettings::default(),
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: TokenSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    // ─────────────────────────────────────────────────────────────────────
    // Issue
    // ─────────────────────────────────────────────────────────────────────

    /// Authenticate with username, password and (when enrolled) a TOTP code.
    ///
    /// Unknown user, wrong password and missing/wrong code all fail with the
    /// same `InvalidCredentials`. Nothing is written on success.
    pub async fn generate_token(
        &self,
        tenant_id: &TenantId,
        username: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> AuthResult<String> {
        let Some(user) = self.repository.user_by_username(tenant_id, username).await? else {
            self.verify_decoy(password).await?;
            warn!(tenant_id = %tenant_id, reason = "unknown_user", "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .credentials
            .verify_password(password, &user.password_hash)
            .await?
        {
            warn!(tenant_id = %tenant_id, user_id = %user.id(), reason = "password", "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(totp_secret) = user.mfa_secret().totp_secret() {
            let accepted = match mfa_code {
                Some(code) => {
                    self.credentials
                        .verify_totp(totp_secret, code, self.settings.totp_window)
                        .await?
                }
                None => false,
            };
            if !accepted {
                warn!(tenant_id = %tenant_id, user_id = %user.id(), reason = "mfa", "login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let token = self.sign(&user)?;
        info!(tenant_id = %tenant_id, user_id = %user.id(), "token issued");
        Ok(token)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Verify
    // ─────────────────────────────────────────────────────────────────────

    /// Verify `token` against the subject's stored secret and return the user.
    pub async fn authenticate(&self, token: &str) -> AuthResult<User> {
        match self.verify(token).await {
            Ok(user) => Ok(user),
            Err(AuthError::Unauthenticated(reason)) => {
                warn!(reason = %reason, "token rejected");
                Err(AuthError::Unauthenticated(reason))
            }
            Err(other) => Err(other),
        }
    }

    /// Verify `token` and attach the subject's groups.
    pub async fn session(&self, token: &str) -> AuthResult<ResolvedUser> {
        let user = self.authenticate(token).await?;
        self.repository.resolve(user).await
    }

    /// Whether the token's subject holds every permission in `required`.
    pub async fn check_permissions(&self, token: &str, required: &[Permission]) -> AuthResult<bool> {
        let session = self.session(token).await?;
        let granted = session.policy().matches(required);
        debug!(
            tenant_id = %session.user().tenant_id(),
            user_id = %session.user().id(),
            required = required.len(),
            granted,
            "permission check"
        );
        Ok(granted)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Revoke / refresh
    // ─────────────────────────────────────────────────────────────────────

    /// Rotate the subject's signing secret, revoking all of its tokens.
    ///
    /// The presented token must itself still be valid.
    pub async fn invalidate_token(&self, token: &str) -> AuthResult<()> {
        let mut user = self.authenticate(token).await?;
        user.rotate_signing_secret();
        self.repository.replace(&user).await?;
        info!(tenant_id = %user.tenant_id(), user_id = %user.id(), "signing secret rotated, tokens revoked");
        Ok(())
    }

    /// Issue a new token with a fresh expiry under the same secret.
    ///
    /// The presented token stays valid until its own expiry.
    pub async fn refresh_token(&self, token: &str) -> AuthResult<String> {
        let user = self.authenticate(token).await?;
        let refreshed = self.sign(&user)?;
        info!(tenant_id = %user.tenant_id(), user_id = %user.id(), "token refreshed");
        Ok(refreshed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // MFA
    // ─────────────────────────────────────────────────────────────────────

    /// Generate and store a TOTP secret. Revokes the user's existing tokens.
    pub async fn enroll_mfa(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        label: &str,
    ) -> AuthResult<TotpEnrollment> {
        let mut user = self.load_user(tenant_id, user_id).await?;
        let enrollment = self.credentials.generate_totp_secret(label).await?;
        user.enable_mfa(enrollment.secret.clone());
        self.repository.replace(&user).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, "mfa enrolled, tokens revoked");
        Ok(enrollment)
    }

    pub async fn is_mfa_enabled(&self, tenant_id: &TenantId, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.load_user(tenant_id, user_id).await?.is_mfa_enabled())
    }

    /// Reset MFA to disabled. Revokes the user's existing tokens.
    pub async fn remove_mfa(&self, tenant_id: &TenantId, user_id: &UserId) -> AuthResult<()> {
        let mut user = self.load_user(tenant_id, user_id).await?;
        user.disable_mfa();
        self.repository.replace(&user).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, "mfa removed, tokens revoked");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    async fn verify_decoy(&self, password: &str) -> AuthResult<()> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.credentials.hash_password(DECOY_PASSWORD))
            .await?;
        self.credentials.verify_password(password, hash).await?;
        Ok(())
    }

    fn sign(&self, user: &User) -> AuthResult<String> {
        // Claims carry whole seconds; the lifetime is measured from the same instant.
        let claims = TokenClaims::new(
            user.tenant_id().clone(),
            user.id().clone(),
            self.clock.now().trunc_subsecs(0),
            self.settings.lifetime,
        );
        jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(user.signing_secret().as_bytes()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    async fn verify(&self, token: &str) -> AuthResult<User> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing.into());
        }

        // The subject selects the key, so it is read before the signature is checked.
        let unverified = decode_unverified(token)?;
        let user = self
            .repository
            .get::<User>(&unverified.tenant_id, &unverified.subject)
            .await?
            .ok_or(TokenError::UnknownSubject)?;

        let claims = decode_verified(token, user.signing_secret().as_bytes())?;
        validate_claims(&claims, self.clock.now()).map_err(TokenError::from)?;
        Ok(user)
    }

    async fn load_user(&self, tenant_id: &TenantId, user_id: &UserId) -> AuthResult<User> {
        self.repository
            .get::<User>(tenant_id, user_id)
            .await?
            .ok_or_else(|| {
                let key = RecordKey::new(tenant_id, EntityKind::User, user_id.as_str());
                AuthError::from(DirectoryError::NotFound(key.to_string()))
            })
    }
}

/// Read claims without checking the signature or expiry.
fn decode_unverified(token: &str) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::Malformed)
}

/// Check the signature with `secret`. Time validation is left to `validate_claims`.
fn decode_verified(token: &str, secret: &[u8]) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })
}
