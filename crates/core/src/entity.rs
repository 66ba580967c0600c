//! Entity trait: identity + continuity across state changes.

use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Tenant-scoped identity shared by every directory entity.
///
/// Embedded by composition into users, groups and clients rather than
/// inherited; the pair `(tenant_id, id)` is the entity's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef<I> {
    pub tenant_id: TenantId,
    pub id: I,
}

impl<I> EntityRef<I> {
    pub fn new(tenant_id: TenantId, id: I) -> Self {
        Self { tenant_id, id }
    }
}

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + AsRef<str>;

    /// Returns the entity identifier (unique within its tenant).
    fn id(&self) -> &Self::Id;

    /// Returns the tenant that owns this entity.
    fn tenant_id(&self) -> &TenantId;
}
