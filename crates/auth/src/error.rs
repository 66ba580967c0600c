//! Authentication / authorization error model.

use thiserror::Error;

use warden_core::DomainError;

use crate::claims::TokenValidationError;
use crate::credentials::CredentialError;
use crate::directory::DirectoryError;

/// Result type used by the token lifecycle manager, the gate and services.
pub type AuthResult<T> = Result<T, AuthError>;

/// Why a presented token was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token missing")]
    Missing,

    #[error("token malformed")]
    Malformed,

    #[error("token expired")]
    Expired,

    #[error("token signature invalid")]
    InvalidSignature,

    #[error("token subject no longer exists")]
    UnknownSubject,
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::Malformed
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username, wrong password or wrong/missing MFA code.
    ///
    /// The message is identical for all three so callers cannot enumerate users.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] TokenError),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Stored data contradicts itself (e.g. a user references a missing group).
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Coarse classification for the calling layer's status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCredentials,
    Unauthenticated,
    Forbidden,
    InternalInconsistency,
    /// Invalid input (validation, conflicts on create, missing entity).
    BadRequest,
    /// Collaborator or signing failure.
    Internal,
}

impl AuthError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn inconsistency(msg: impl Into<String>) -> Self {
        Self::InternalInconsistency(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AuthError::Forbidden(_) => ErrorKind::Forbidden,
            AuthError::InternalInconsistency(_) => ErrorKind::InternalInconsistency,
            AuthError::Domain(_) => ErrorKind::BadRequest,
            AuthError::Directory(DirectoryError::AlreadyExists(_) | DirectoryError::NotFound(_)) => {
                ErrorKind::BadRequest
            }
            AuthError::Directory(_) | AuthError::Credentials(_) | AuthError::Signing(_) => {
                ErrorKind::Internal
            }
        }
    }
}
