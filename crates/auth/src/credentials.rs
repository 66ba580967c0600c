//! Credential verifier boundary (password hashing and TOTP).

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("totp failure: {0}")]
    Totp(String),
}

/// Fresh TOTP material for enrollment.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpEnrollment {
    /// Base32 shared secret, stored on the user.
    pub secret: String,
    /// `otpauth://` URI for authenticator apps.
    pub provisioning_uri: String,
}

impl core::fmt::Debug for TotpEnrollment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TotpEnrollment")
            .field("provisioning_uri", &"..")
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, CredentialError>;

    /// `Ok(false)` on mismatch; `Err` only when the hash itself is unusable.
    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CredentialError>;

    /// Check `code` against `secret`, accepting `window` steps either side of now.
    async fn verify_totp(&self, secret: &str, code: &str, window: u8)
    -> Result<bool, CredentialError>;

    /// New TOTP secret labelled with `account` for the provisioning URI.
    async fn generate_totp_secret(&self, account: &str) -> Result<TotpEnrollment, CredentialError>;
}
