use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::{TenantId, UserId};

/// Token claims model.
///
/// Deliberately carries identity only. Permissions are never embedded; they
/// are resolved from the directory on every verification so that group and
/// permission changes take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Tenant context for the token.
    #[serde(rename = "tenant")]
    pub tenant_id: TenantId,

    /// Subject / user identifier.
    #[serde(rename = "sub")]
    pub subject: UserId,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn new(tenant_id: TenantId, subject: UserId, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            tenant_id,
            subject,
            issued_at,
            expires_at: issued_at + lifetime,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// the token lifecycle manager before this is called.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn claims_at(issued_at: DateTime<Utc>) -> TokenClaims {
        TokenClaims::new(
            TenantId::new("t1").unwrap(),
            UserId::new("alice").unwrap(),
            issued_at,
            Duration::minutes(30),
        )
    }

    #[test]
    fn valid_inside_window() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0);
        assert_eq!(validate_claims(&claims, t0), Ok(()));
        assert_eq!(validate_claims(&claims, t0 + Duration::minutes(29)), Ok(()));
    }

    #[test]
    fn expires_at_boundary() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0);
        assert_eq!(
            validate_claims(&claims, t0 + Duration::minutes(30)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn rejects_future_and_inverted_windows() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0);
        assert_eq!(
            validate_claims(&claims, t0 - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );

        let mut inverted = claims_at(t0);
        inverted.expires_at = t0;
        assert_eq!(
            validate_claims(&inverted, t0),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn serializes_standard_claim_names() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(claims_at(t0)).unwrap();
        assert_eq!(json["tenant"], "t1");
        assert_eq!(json["sub"], "alice");
        assert_eq!(json["iat"], t0.timestamp());
        assert_eq!(json["exp"], (t0 + Duration::minutes(30)).timestamp());
    }
}
