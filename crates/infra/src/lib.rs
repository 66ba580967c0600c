//! Infrastructure layer: directory storage, credential verification, config.

pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod directory;

pub use bootstrap::{Warden, bootstrap};
pub use config::WardenConfig;
pub use credentials::BcryptTotpVerifier;
pub use directory::InMemoryDirectory;
