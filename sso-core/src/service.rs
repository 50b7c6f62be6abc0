//! Login, registration and privilege queries.

use chrono::{Duration, Utc};
use std::{fmt, future::Future, sync::Arc, time::Duration as StdDuration};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::SecretHasher;
use crate::domain::{ApplicationId, IdentityId};
use crate::error::{AuthError, AuthResult};
use crate::store::{CredentialStore, StoreError, StoreResult};
use crate::token::{TokenClaims, TokenError, TokenIssuer};

#[derive(Debug, Clone, Copy)]
pub struct AuthServiceSettings {
    /// Lifetime of issued tokens. Must be positive.
    pub token_ttl: Duration,
    /// Upper bound on any single store call.
    pub store_timeout: StdDuration,
}

impl Default for AuthServiceSettings {
    fn default() -> Self {
        Self {
            token_ttl: Duration::hours(1),
            store_timeout: StdDuration::from_secs(5),
        }
    }
}

/// Orchestrates the credential store, secret hasher and token issuer.
///
/// Every method is an independent request: the service holds no per-call
/// state and is shared across tasks behind an `Arc`.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<SecretHasher>,
    issuer: TokenIssuer,
    settings: AuthServiceSettings,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("store_refs", &Arc::strong_count(&self.store))
            .field("issuer", &self.issuer)
            .field("settings", &self.settings)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<SecretHasher>,
        issuer: TokenIssuer,
        settings: AuthServiceSettings,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            settings,
        }
    }

    pub fn settings(&self) -> &AuthServiceSettings {
        &self.settings
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        tokio::time::timeout(self.settings.store_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }

    /// Register a new identity and return its id.
    pub async fn register(&self, email: &str, secret: &str) -> AuthResult<IdentityId> {
        const OP: &str = "auth.register";

        if email.trim().is_empty() {
            return Err(AuthError::Validation("email is required"));
        }
        if secret.trim().is_empty() {
            return Err(AuthError::Validation("secret is required"));
        }

        debug!(op = OP, email, "registering new identity");

        let secret_hash = self
            .hasher
            .hash_blocking(Zeroizing::new(secret.to_owned()))
            .await
            .map_err(|err| AuthError::from_hash(OP, err))?;

        let id = self
            .bounded(self.store.save_identity(email, &secret_hash))
            .await
            .map_err(|err| match err {
                StoreError::AlreadyExists => {
                    debug!(op = OP, email, "identity already exists");
                    AuthError::AlreadyExists
                }
                other => AuthError::from_store(OP, other),
            })?;

        info!(op = OP, identity_id = %id, "identity registered");
        Ok(id)
    }

    /// Check credentials and mint a token for `application_id`.
    ///
    /// An unknown email and a wrong secret both fail `InvalidCredentials`
    /// after the same amount of hashing work.
    pub async fn login(
        &self,
        email: &str,
        secret: &str,
        application_id: ApplicationId,
    ) -> AuthResult<String> {
        const OP: &str = "auth.login";

        debug!(op = OP, email, app_id = %application_id, "attempting login");

        let application = self
            .bounded(self.store.application_by_id(application_id))
            .await
            .map_err(|err| {
                if matches!(err, StoreError::NotFound) {
                    warn!(op = OP, app_id = %application_id, "unknown application");
                }
                AuthError::from_store(OP, err)
            })?;

        let identity = match self.bounded(self.store.identity_by_email(email)).await {
            Ok(identity) => Some(identity),
            Err(StoreError::NotFound) => None,
            Err(other) => return Err(AuthError::from_store(OP, other)),
        };

        let matched = self
            .hasher
            .verify_blocking(
                Zeroizing::new(secret.to_owned()),
                identity.as_ref().map(|identity| identity.secret_hash.clone()),
            )
            .await
            .map_err(|err| AuthError::from_hash(OP, err))?;

        let identity = match identity {
            Some(identity) if matched => identity,
            _ => {
                debug!(op = OP, email, "invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self
            .issuer
            .issue(&identity, &application, Utc::now(), self.settings.token_ttl)
            .map_err(|err| AuthError::from_token(OP, err))?;

        info!(op = OP, identity_id = %identity.id, app_id = %application.id, "login succeeded");
        Ok(token)
    }

    pub async fn is_admin(&self, identity_id: IdentityId) -> AuthResult<bool> {
        const OP: &str = "auth.is_admin";

        let is_admin = self
            .bounded(self.store.is_admin(identity_id))
            .await
            .map_err(|err| AuthError::from_store(OP, err))?;

        info!(op = OP, identity_id = %identity_id, is_admin, "checked admin flag");
        Ok(is_admin)
    }

    /// Verify a token offline against the secret of `application_id`.
    ///
    /// Not part of the RPC surface; downstream services holding the
    /// application secret do the same check.
    pub async fn verify_token(
        &self,
        token: &str,
        application_id: ApplicationId,
    ) -> AuthResult<TokenClaims> {
        const OP: &str = "auth.verify_token";

        let application = self
            .bounded(self.store.application_by_id(application_id))
            .await
            .map_err(|err| AuthError::from_store(OP, err))?;

        self.issuer
            .verify(token, &application, Utc::now())
            .map_err(|err| match err {
                TokenError::MissingSecret(_) | TokenError::Signing(_) => {
                    AuthError::from_token(OP, err)
                }
                _ => AuthError::InvalidCredentials,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HashingParams;
    use crate::domain::{Application, Identity};
    use crate::store::MockCredentialStore;

    fn hasher() -> Arc<SecretHasher> {
        Arc::new(SecretHasher::with_params("pepper", HashingParams::insecure_fast()).unwrap())
    }

    fn service(store: MockCredentialStore) -> AuthService {
        AuthService::new(
            Arc::new(store),
            hasher(),
            TokenIssuer::new(),
            AuthServiceSettings::default(),
        )
    }

    #[tokio::test]
    async fn register_rejects_blank_secret_without_touching_store() {
        let svc = service(MockCredentialStore::new());
        for secret in ["", " ", "\t \n"] {
            assert!(matches!(
                svc.register("a@x.com", secret).await,
                Err(AuthError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn register_maps_backend_failure_to_internal() {
        let mut store = MockCredentialStore::new();
        store
            .expect_save_identity()
            .returning(|_, _| Err(StoreError::Backend(anyhow::anyhow!("connection reset"))));

        let err = service(store).register("a@x.com", "pw123456").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal { op: "auth.register", .. }));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emails_stay_out_of_info_logs() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut store = MockCredentialStore::new();
        store
            .expect_save_identity()
            .returning(|_, _| Ok(IdentityId(7)));
        store
            .expect_application_by_id()
            .returning(|id| Ok(Application::new(id, "web", "secret")));
        store
            .expect_identity_by_email()
            .returning(|_| Err(StoreError::NotFound));
        let svc = service(store);

        tracing::subscriber::with_default(subscriber, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                svc.register("someone@x.com", "pw123456").await.unwrap();
                let _ = svc.login("someone@x.com", "pw123456", ApplicationId(1)).await;
            });
        });

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("identity registered"));
        assert!(!output.contains("someone@x.com"), "{output}");
    }

    #[tokio::test]
    async fn login_fails_closed_on_unknown_application() {
        let mut store = MockCredentialStore::new();
        store
            .expect_application_by_id()
            .returning(|_| Err(StoreError::NotFound));
        store.expect_identity_by_email().never();

        let err = service(store)
            .login("a@x.com", "pw123456", ApplicationId(9))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn login_surfaces_store_fault_as_internal() {
        let mut store = MockCredentialStore::new();
        store
            .expect_application_by_id()
            .returning(|id| Ok(Application::new(id, "web", "secret")));
        store
            .expect_identity_by_email()
            .returning(|_| Err(StoreError::Timeout));

        let err = service(store)
            .login("a@x.com", "pw123456", ApplicationId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal { op: "auth.login", .. }));
    }

    #[tokio::test]
    async fn login_with_corrupt_hash_is_internal() {
        let mut store = MockCredentialStore::new();
        store
            .expect_application_by_id()
            .returning(|id| Ok(Application::new(id, "web", "secret")));
        store.expect_identity_by_email().returning(|email| {
            Ok(Identity {
                id: IdentityId(1),
                email: email.to_string(),
                secret_hash: "garbage".into(),
                is_admin: false,
            })
        });

        let err = service(store)
            .login("a@x.com", "pw123456", ApplicationId(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "internal");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        #[derive(Debug)]
        struct Stalled;

        #[async_trait::async_trait]
        impl CredentialStore for Stalled {
            async fn save_identity(&self, _: &str, _: &str) -> StoreResult<IdentityId> {
                std::future::pending().await
            }
            async fn identity_by_email(&self, _: &str) -> StoreResult<Identity> {
                std::future::pending().await
            }
            async fn is_admin(&self, _: IdentityId) -> StoreResult<bool> {
                std::future::pending().await
            }
            async fn application_by_id(&self, _: ApplicationId) -> StoreResult<Application> {
                std::future::pending().await
            }
        }

        let svc = AuthService::new(
            Arc::new(Stalled),
            hasher(),
            TokenIssuer::new(),
            AuthServiceSettings {
                token_ttl: Duration::minutes(5),
                store_timeout: StdDuration::from_millis(50),
            },
        );

        let err = svc.is_admin(IdentityId(1)).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal { op: "auth.is_admin", .. }));
    }
}
