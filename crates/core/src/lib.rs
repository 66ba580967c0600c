//! `warden-core` — identity foundation building blocks.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::{Entity, EntityRef};
pub use error::{DomainError, DomainResult};
pub use id::{GroupId, TYPE_SEPARATOR, TenantId, UserId};
