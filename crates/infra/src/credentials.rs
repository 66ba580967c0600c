//! bcrypt password hashing and RFC 6238 TOTP.

use std::sync::Arc;

use async_trait::async_trait;
use totp_rs::{Algorithm, Secret, TOTP};

use warden_auth::{CredentialError, CredentialVerifier, TotpEnrollment};
use warden_core::{Clock, SystemClock};

const TOTP_DIGITS: usize = 6;

#[derive(Debug, Clone)]
pub struct BcryptTotpVerifier {
    bcrypt_cost: u32,
    totp_step_seconds: u64,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl BcryptTotpVerifier {
    pub fn new(bcrypt_cost: u32, totp_step_seconds: u64, issuer: impl Into<String>) -> Self {
        Self {
            bcrypt_cost,
            totp_step_seconds,
            issuer: issuer.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// TOTP codes are checked against this clock instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn totp(&self, secret: Vec<u8>, skew: u8, account: &str) -> Result<TOTP, CredentialError> {
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            skew,
            self.totp_step_seconds,
            secret,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| CredentialError::Totp(e.to_string()))
    }
}

#[async_trait]
impl CredentialVerifier for BcryptTotpVerifier {
    async fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    async fn verify_totp(
        &self,
        secret: &str,
        code: &str,
        window: u8,
    ) -> Result<bool, CredentialError> {
        let bytes = Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|e| CredentialError::Totp(e.to_string()))?;
        // Account name does not take part in code verification.
        let totp = self.totp(bytes, window, "user")?;
        let now = u64::try_from(self.clock.now().timestamp())
            .map_err(|e| CredentialError::Totp(e.to_string()))?;
        Ok(totp.check(code, now))
    }

    async fn generate_totp_secret(&self, account: &str) -> Result<TotpEnrollment, CredentialError> {
        let bytes = Secret::generate_secret()
            .to_bytes()
            .map_err(|e| CredentialError::Totp(e.to_string()))?;
        let totp = self.totp(bytes, 0, account)?;
        Ok(TotpEnrollment {
            secret: totp.get_secret_base32(),
            provisioning_uri: totp.get_url(),
        })
    }
}
