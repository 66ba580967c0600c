mod common;

use std::collections::BTreeSet;

use warden_auth::{AuthError, DirectoryError, ErrorKind, NewUser, UserUpdate};
use warden_core::{DomainError, Entity, GroupId, UserId};

use common::{PASSWORD, TestEnv, perms, tenant};

#[tokio::test]
async fn created_user_has_hashed_password_and_mfa_off() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let alice = env.user(&t1, "alice", false, &[]).await;

    assert_ne!(alice.password_hash, PASSWORD);
    assert!(!alice.is_mfa_enabled());

    let stored = env.warden.users.get(&t1, alice.id()).await.unwrap();
    assert_eq!(stored, alice);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    env.user(&t1, "alice", false, &[]).await;

    let err = env
        .warden
        .users
        .create(
            &t1,
            NewUser {
                id: None,
                username: "alice".to_string(),
                password: "other".to_string(),
                is_admin: false,
                groups: BTreeSet::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Directory(DirectoryError::AlreadyExists(_))));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn unknown_group_reference_is_a_validation_error() {
    let env = TestEnv::new();
    let err = env
        .warden
        .users
        .create(
            &tenant("t1"),
            NewUser {
                id: None,
                username: "alice".to_string(),
                password: PASSWORD.to_string(),
                is_admin: false,
                groups: BTreeSet::from([GroupId::new("nope").unwrap()]),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Domain(DomainError::Validation(_))));
    assert!(env.directory.is_empty());
}

#[tokio::test]
async fn update_preserves_signing_secret_and_mfa() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let g1 = env.group(&t1, "g1", &["docs/read"]).await;
    let alice = env.user(&t1, "alice", false, &[]).await;
    let tokens = &env.warden.tokens;

    let token = env.login(&t1, "alice").await;
    let updated = env
        .warden
        .users
        .update(
            &t1,
            alice.id(),
            UserUpdate {
                username: "alice.liddell".to_string(),
                password: None,
                is_admin: true,
                groups: BTreeSet::from([g1]),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.signing_secret(), alice.signing_secret());
    assert_eq!(updated.password_hash, alice.password_hash);
    assert!(tokens.check_permissions(&token, &perms(&["docs/read"])).await.unwrap());
    assert!(env.warden.gate.tenant_admin(&t1, &token).await.is_ok());

    tokens
        .generate_token(&t1, "alice.liddell", PASSWORD, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn password_change_takes_effect_without_revoking() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let alice = env.user(&t1, "alice", false, &[]).await;
    let token = env.login(&t1, "alice").await;

    env.warden
        .users
        .update(
            &t1,
            alice.id(),
            UserUpdate {
                username: "alice".to_string(),
                password: Some("new password".to_string()),
                is_admin: false,
                groups: BTreeSet::new(),
            },
        )
        .await
        .unwrap();

    let tokens = &env.warden.tokens;
    assert!(tokens.authenticate(&token).await.is_ok());
    assert!(matches!(
        tokens.generate_token(&t1, "alice", PASSWORD, None).await.unwrap_err(),
        AuthError::InvalidCredentials
    ));
    tokens
        .generate_token(&t1, "alice", "new password", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_cannot_steal_a_username() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let alice = env.user(&t1, "alice", false, &[]).await;
    env.user(&t1, "bob", false, &[]).await;

    let err = env
        .warden
        .users
        .update(
            &t1,
            alice.id(),
            UserUpdate {
                username: "bob".to_string(),
                password: None,
                is_admin: false,
                groups: BTreeSet::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Directory(DirectoryError::AlreadyExists(_))));
}

#[tokio::test]
async fn resolve_fails_loudly_for_dangling_group() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let g1 = env.group(&t1, "g1", &["docs/read"]).await;
    let alice = env.user(&t1, "alice", false, &[&g1]).await;

    let resolved = env.warden.users.resolve(alice.clone()).await.unwrap();
    assert_eq!(resolved.groups().len(), 1);
    assert!(resolved.policy().matches(&perms(&["docs/read"])));

    env.warden.groups.delete(&t1, &g1).await.unwrap();
    let err = env.warden.users.resolve(alice).await.unwrap_err();
    assert!(matches!(err, AuthError::InternalInconsistency(_)));
}

#[tokio::test]
async fn listing_is_tenant_scoped() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let t2 = tenant("t2");
    env.user(&t1, "alice", false, &[]).await;
    env.user(&t1, "bob", false, &[]).await;
    env.user(&t2, "carol", false, &[]).await;
    env.group(&t2, "g1", &[]).await;

    assert_eq!(env.warden.users.list(&t1).await.unwrap().len(), 2);
    assert_eq!(env.warden.users.list(&t2).await.unwrap().len(), 1);
    assert!(env.warden.groups.list(&t1).await.unwrap().is_empty());
}

#[tokio::test]
async fn group_crud() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let groups = &env.warden.groups;
    let g1 = env.group(&t1, "g1", &["docs/read", "-docs/secret"]).await;

    let stored = groups.get(&t1, &g1).await.unwrap();
    assert_eq!(stored.permissions, perms(&["docs/read", "-docs/secret"]));

    groups.delete(&t1, &g1).await.unwrap();
    let err = groups.get(&t1, &g1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(groups.delete(&t1, &g1).await.is_err());
}

#[tokio::test]
async fn client_admins_are_append_only() {
    let env = TestEnv::new();
    let t1 = tenant("t1");
    let clients = &env.warden.clients;
    let root = env.user(&t1, "root", true, &[]).await;
    let alice = env.user(&t1, "alice", false, &[]).await;

    let err = clients.register(&t1, vec![]).await.unwrap_err();
    assert!(matches!(err, AuthError::Domain(DomainError::InvariantViolation(_))));

    clients.register(&t1, vec![root.id().clone()]).await.unwrap();
    assert!(clients.register(&t1, vec![root.id().clone()]).await.is_err());

    let client = clients.add_admin(&t1, alice.id().clone()).await.unwrap();
    assert_eq!(client.admin_users(), &[root.id().clone(), alice.id().clone()]);

    let again = clients.add_admin(&t1, alice.id().clone()).await.unwrap();
    assert_eq!(again.admin_users().len(), 2);

    let err = clients
        .add_admin(&t1, UserId::new("ghost").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    assert_eq!(clients.get(&t1).await.unwrap(), again);
}
