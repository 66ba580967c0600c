//! Entity services: CRUD over the directory with the model's invariants applied.

mod clients;
mod groups;
mod users;

pub use clients::ClientService;
pub use groups::{GroupService, GroupUpdate, NewGroup};
pub use users::{NewUser, UserService, UserUpdate};

use warden_core::TenantId;

use crate::directory::DirectoryError;
use crate::error::AuthError;
use crate::record::{EntityKind, RecordKey};

fn not_found(tenant_id: &TenantId, kind: EntityKind, id: &str) -> AuthError {
    DirectoryError::NotFound(RecordKey::new(tenant_id, kind, id).to_string()).into()
}
