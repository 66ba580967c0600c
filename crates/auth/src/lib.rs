//! `warden-auth` — tenant-scoped authentication and authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: the directory
//! and the credential verifier are consumed through traits.

pub mod claims;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod gate;
pub mod group;
pub mod permissions;
pub mod policy;
pub mod record;
pub mod services;
pub mod tenant;
pub mod token;
pub mod user;

pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use credentials::{CredentialError, CredentialVerifier, TotpEnrollment};
pub use directory::{Directory, DirectoryError, Repository};
pub use error::{AuthError, AuthResult, ErrorKind, TokenError};
pub use gate::{Gate, bearer_token};
pub use group::Group;
pub use permissions::Permission;
pub use policy::{Denial, PolicyDecision, PolicyEngine};
pub use record::{EntityKind, Record, RecordKey, StorageRecord};
pub use services::{ClientService, GroupService, GroupUpdate, NewGroup, NewUser, UserService, UserUpdate};
pub use tenant::Client;
pub use token::{DEFAULT_TOKEN_LIFETIME_MINUTES, TOTP_WINDOW, TokenManager, TokenSettings};
pub use user::{MFA_DISABLED_SENTINEL, MfaSecret, ResolvedUser, SigningSecret, User};
