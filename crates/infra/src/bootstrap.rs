//! Process wiring: configuration, directory, verifier and services.

use std::sync::Arc;

use tracing::info;

use warden_auth::{
    ClientService, Directory, Gate, GroupService, Repository, TokenManager, UserService,
};
use warden_core::{Clock, SystemClock};

use crate::config::WardenConfig;
use crate::directory::InMemoryDirectory;

/// Fully wired services sharing one directory and one verifier.
#[derive(Clone)]
pub struct Warden {
    pub repository: Repository,
    pub tokens: TokenManager,
    pub gate: Gate,
    pub users: UserService,
    pub groups: GroupService,
    pub clients: ClientService,
}

impl Warden {
    pub fn new(config: &WardenConfig, directory: Arc<dyn Directory>, clock: Arc<dyn Clock>) -> Self {
        let repository = Repository::new(directory);
        let credentials = Arc::new(config.credential_verifier(clock.clone()));

        let tokens = TokenManager::new(repository.clone(), credentials.clone())
            .with_clock(clock)
            .with_settings(config.token_settings());

        Self {
            gate: Gate::new(tokens.clone()),
            users: UserService::new(repository.clone(), credentials),
            groups: GroupService::new(repository.clone()),
            clients: ClientService::new(repository.clone()),
            tokens,
            repository,
        }
    }

    /// Services over a fresh in-memory directory and the system clock.
    pub fn in_memory(config: &WardenConfig) -> Self {
        Self::new(config, Arc::new(InMemoryDirectory::new()), Arc::new(SystemClock))
    }
}

/// Install logging, load configuration and wire the in-memory services.
pub fn bootstrap() -> anyhow::Result<Warden> {
    warden_observability::init();

    let config = WardenConfig::load()?;
    info!(
        token_lifetime_minutes = config.token.lifetime_minutes,
        totp_window = config.totp.window,
        "configuration loaded"
    );

    Ok(Warden::in_memory(&config))
}
