use std::sync::Arc;

use chrono::Duration;
use sso_core::{
    Application, ApplicationId, AuthError, AuthService, AuthServiceSettings,
    HashingParams, IdentityId, InMemoryCredentialStore, SecretHasher,
    TokenIssuer,
};

struct Harness {
    store: Arc<InMemoryCredentialStore>,
    service: Arc<AuthService>,
}

fn harness() -> Harness {
    let store = Arc::new(
        InMemoryCredentialStore::new()
            .with_application(Application::new(ApplicationId(1), "web", "web-secret"))
            .with_application(Application::new(ApplicationId(2), "mobile", "mobile-secret")),
    );
    let hasher = Arc::new(
        SecretHasher::with_params("test-pepper", HashingParams::insecure_fast())
            .expect("hasher"),
    );
    let service = Arc::new(AuthService::new(
        store.clone(),
        hasher,
        TokenIssuer::new(),
        AuthServiceSettings {
            token_ttl: Duration::minutes(15),
            ..AuthServiceSettings::default()
        },
    ));
    Harness { store, service }
}

#[tokio::test]
async fn register_then_login_returns_token() {
    let h = harness();
    for (email, secret) in [
        ("a@x.com", "pw123456"),
        ("b@example.org", "correct horse battery staple"),
        ("c@x.com", "ünïcødé-secret"),
    ] {
        h.service.register(email, secret).await.unwrap();
        let token = h.service.login(email, secret, ApplicationId(1)).await.unwrap();
        assert!(!token.is_empty());
    }
}

#[tokio::test]
async fn wrong_secret_and_unknown_email_fail_the_same_way() {
    let h = harness();
    h.service.register("a@x.com", "pw123456").await.unwrap();

    let wrong_secret = h
        .service
        .login("a@x.com", "wrong", ApplicationId(1))
        .await
        .unwrap_err();
    let unknown_email = h
        .service
        .login("nobody@x.com", "pw123456", ApplicationId(1))
        .await
        .unwrap_err();

    assert!(matches!(wrong_secret, AuthError::InvalidCredentials));
    assert!(matches!(unknown_email, AuthError::InvalidCredentials));
    assert_eq!(wrong_secret.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn duplicate_registration_leaves_first_identity_intact() {
    let h = harness();
    let first = h.service.register("a@x.com", "pw123456").await.unwrap();

    let err = h.service.register("a@x.com", "different").await.unwrap_err();
    assert!(matches!(err, AuthError::AlreadyExists));
    assert_eq!(h.store.identity_count(), 1);

    // The first secret still works; the rejected one does not.
    h.service.login("a@x.com", "pw123456", ApplicationId(1)).await.unwrap();
    assert!(matches!(
        h.service.login("a@x.com", "different", ApplicationId(1)).await,
        Err(AuthError::InvalidCredentials)
    ));
    let claims = h
        .service
        .verify_token(
            &h.service.login("a@x.com", "pw123456", ApplicationId(1)).await.unwrap(),
            ApplicationId(1),
        )
        .await
        .unwrap();
    assert_eq!(claims.uid, first);
}

#[tokio::test]
async fn admin_flag_for_fresh_granted_and_unknown_identities() {
    let h = harness();
    let id = h.service.register("a@x.com", "pw123456").await.unwrap();
    assert!(!h.service.is_admin(id).await.unwrap());

    assert!(h.store.grant_admin(id));
    assert!(h.service.is_admin(id).await.unwrap());

    assert!(matches!(
        h.service.is_admin(IdentityId(404)).await,
        Err(AuthError::NotFound)
    ));
}

#[tokio::test]
async fn login_against_unknown_application_is_not_found() {
    let h = harness();
    h.service.register("a@x.com", "pw123456").await.unwrap();
    assert!(matches!(
        h.service.login("a@x.com", "pw123456", ApplicationId(99)).await,
        Err(AuthError::NotFound)
    ));
}

#[tokio::test]
async fn blank_secret_is_rejected_before_storage() {
    let h = harness();
    for secret in ["", " ", "   \t"] {
        assert!(matches!(
            h.service.register("a@x.com", secret).await,
            Err(AuthError::Validation(_))
        ));
    }
    assert_eq!(h.store.identity_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_of_one_email_has_one_winner() {
    let h = harness();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let service = h.service.clone();
            tokio::spawn(async move { service.register("race@x.com", &format!("pw-{i}")).await })
        })
        .collect();

    let mut wins = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AuthError::AlreadyExists) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(h.store.identity_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_registration_of_distinct_emails_gets_distinct_ids() {
    let h = harness();
    let a = {
        let service = h.service.clone();
        tokio::spawn(async move { service.register("a@x.com", "pw-a").await })
    };
    let b = {
        let service = h.service.clone();
        tokio::spawn(async move { service.register("b@x.com", "pw-b").await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn token_is_bound_to_its_application() {
    let h = harness();
    let id = h.service.register("a@x.com", "pw123456").await.unwrap();
    let token = h
        .service
        .login("a@x.com", "pw123456", ApplicationId(1))
        .await
        .unwrap();

    let claims = h.service.verify_token(&token, ApplicationId(1)).await.unwrap();
    assert_eq!(claims.uid, id);
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.app_id, ApplicationId(1));
    assert_eq!(claims.exp - claims.iat, 15 * 60);

    assert!(matches!(
        h.service.verify_token(&token, ApplicationId(2)).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn end_to_end_scenario() {
    let h = harness();

    let id = h.service.register("a@x.com", "pw123456").await.unwrap();
    assert_eq!(id, IdentityId(1));

    let token = h
        .service
        .login("a@x.com", "pw123456", ApplicationId(1))
        .await
        .unwrap();
    assert!(!token.is_empty());

    assert!(matches!(
        h.service.login("a@x.com", "wrong", ApplicationId(1)).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(!h.service.is_admin(IdentityId(1)).await.unwrap());
    assert!(matches!(
        h.service.register("a@x.com", "anything").await,
        Err(AuthError::AlreadyExists)
    ));
}
