#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use warden_auth::{NewGroup, NewUser, Permission, User};
use warden_core::{GroupId, ManualClock, TenantId, UserId};
use warden_infra::{InMemoryDirectory, Warden, WardenConfig};

pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestEnv {
    pub warden: Warden,
    pub clock: Arc<ManualClock>,
    pub directory: Arc<InMemoryDirectory>,
}

impl TestEnv {
    pub fn new() -> Self {
        let config = WardenConfig::from_toml_str("[password]\nbcrypt_cost = 4")
            .expect("test config is valid");
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap(),
        ));
        let directory = Arc::new(InMemoryDirectory::new());
        let warden = Warden::new(&config, directory.clone(), clock.clone());
        Self {
            warden,
            clock,
            directory,
        }
    }

    pub async fn group(&self, tenant: &TenantId, id: &str, permissions: &[&str]) -> GroupId {
        let permissions = permissions
            .iter()
            .map(|raw| Permission::parse(raw).unwrap())
            .collect();
        self.warden
            .groups
            .create(
                tenant,
                NewGroup {
                    id: Some(GroupId::new(id).unwrap()),
                    name: id.to_string(),
                    permissions,
                },
            )
            .await
            .unwrap()
            .entity
            .id
    }

    pub async fn user(&self, tenant: &TenantId, username: &str, is_admin: bool, groups: &[&GroupId]) -> User {
        self.warden
            .users
            .create(
                tenant,
                NewUser {
                    id: Some(UserId::new(username).unwrap()),
                    username: username.to_string(),
                    password: PASSWORD.to_string(),
                    is_admin,
                    groups: groups.iter().map(|g| (*g).clone()).collect::<BTreeSet<_>>(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn login(&self, tenant: &TenantId, username: &str) -> String {
        self.warden
            .tokens
            .generate_token(tenant, username, PASSWORD, None)
            .await
            .unwrap()
    }
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

pub fn perms(raw: &[&str]) -> Vec<Permission> {
    raw.iter().map(|p| Permission::parse(p).unwrap()).collect()
}
