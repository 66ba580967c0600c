//! Users, their rotating signing secret and their MFA state.

use std::collections::BTreeSet;

use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use warden_core::{Entity, EntityRef, GroupId, TenantId, UserId};

use crate::record::{EntityKind, Record};
use crate::{Group, PolicyEngine};

/// Stored MFA value meaning "two-factor authentication disabled".
///
/// Lower-case letters and underscores never appear in a base32 TOTP secret,
/// so this cannot collide with a real one.
pub const MFA_DISABLED_SENTINEL: &str = "__mfa_disabled__";

const SIGNING_SECRET_LEN: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Secrets
// ─────────────────────────────────────────────────────────────────────────────

/// Per-user symmetric key for that user's tokens.
///
/// Replacing it is the only way tokens are revoked: every token signed with the
/// previous value stops verifying.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn generate() -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SIGNING_SECRET_LEN)
            .map(char::from)
            .collect();
        Self(secret)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

/// Two-factor state, stored as either a base32 TOTP secret or the sentinel.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MfaSecret {
    #[default]
    Disabled,
    Enabled(String),
}

impl MfaSecret {
    pub fn is_enabled(&self) -> bool {
        matches!(self, MfaSecret::Enabled(_))
    }

    pub fn totp_secret(&self) -> Option<&str> {
        match self {
            MfaSecret::Enabled(secret) => Some(secret),
            MfaSecret::Disabled => None,
        }
    }
}

impl From<String> for MfaSecret {
    fn from(value: String) -> Self {
        if value == MFA_DISABLED_SENTINEL {
            MfaSecret::Disabled
        } else {
            MfaSecret::Enabled(value)
        }
    }
}

impl From<MfaSecret> for String {
    fn from(value: MfaSecret) -> Self {
        match value {
            MfaSecret::Disabled => MFA_DISABLED_SENTINEL.to_string(),
            MfaSecret::Enabled(secret) => secret,
        }
    }
}

impl core::fmt::Debug for MfaSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MfaSecret::Disabled => f.write_str("MfaSecret::Disabled"),
            MfaSecret::Enabled(_) => f.write_str("MfaSecret::Enabled(..)"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A user of one tenant.
///
/// # Invariants
/// - Belongs to exactly one tenant; `username` is unique within it.
/// - The signing secret only changes through [`User::rotate_signing_secret`],
///   directly or as part of enabling/disabling MFA.
/// - Group ids are references only; see [`ResolvedUser`] for the groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub entity: EntityRef<UserId>,

    pub username: String,

    pub password_hash: String,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups: BTreeSet<GroupId>,

    signing_secret: SigningSecret,

    #[serde(default)]
    mfa_secret: MfaSecret,
}

impl User {
    /// New user with a fresh signing secret and MFA disabled.
    pub fn new(
        tenant_id: TenantId,
        id: UserId,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        is_admin: bool,
        groups: BTreeSet<GroupId>,
    ) -> Self {
        Self {
            entity: EntityRef::new(tenant_id, id),
            username: username.into(),
            password_hash: password_hash.into(),
            is_admin,
            groups,
            signing_secret: SigningSecret::generate(),
            mfa_secret: MfaSecret::Disabled,
        }
    }

    pub fn signing_secret(&self) -> &SigningSecret {
        &self.signing_secret
    }

    pub fn mfa_secret(&self) -> &MfaSecret {
        &self.mfa_secret
    }

    pub fn is_mfa_enabled(&self) -> bool {
        self.mfa_secret.is_enabled()
    }

    /// Invalidate every outstanding token of this user.
    pub fn rotate_signing_secret(&mut self) {
        self.signing_secret = SigningSecret::generate();
    }

    /// Store a TOTP secret. Also rotates the signing secret.
    pub fn enable_mfa(&mut self, totp_secret: String) {
        self.mfa_secret = MfaSecret::Enabled(totp_secret);
        self.rotate_signing_secret();
    }

    /// Reset MFA to the disabled sentinel. Also rotates the signing secret.
    pub fn disable_mfa(&mut self) {
        self.mfa_secret = MfaSecret::Disabled;
        self.rotate_signing_secret();
    }

    /// Take over credentials from the stored version of this user.
    ///
    /// Used on profile updates so that editing other fields never rotates the
    /// signing secret or touches MFA.
    pub fn keep_secrets_of(&mut self, stored: &User) {
        self.signing_secret = stored.signing_secret.clone();
        self.mfa_secret = stored.mfa_secret.clone();
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.entity.id
    }

    fn tenant_id(&self) -> &TenantId {
        &self.entity.tenant_id
    }
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolved user
// ─────────────────────────────────────────────────────────────────────────────

/// A user together with its group objects.
///
/// Only produced by the repository's resolution step, which fails loudly when
/// a referenced group does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    user: User,
    groups: Vec<Group>,
}

impl ResolvedUser {
    pub(crate) fn new(user: User, groups: Vec<Group>) -> Self {
        Self { user, groups }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn policy(&self) -> PolicyEngine {
        PolicyEngine::for_groups(&self.groups)
    }

    pub fn into_parts(self) -> (User, Vec<Group>) {
        (self.user, self.groups)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
