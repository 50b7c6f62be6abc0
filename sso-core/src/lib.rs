//! # SSO Core
//!
//! Authentication core of a multi-tenant single-sign-on service: credential
//! verification, secret hashing, token issuance and error classification.
//!
//! ## Overview
//!
//! - [`service::AuthService`]: register, login and admin queries
//! - [`store::CredentialStore`]: persistence capability, with in-memory and
//!   PostgreSQL adapters
//! - [`crypto::SecretHasher`]: Argon2id hashing with a server-side pepper
//! - [`token::TokenIssuer`]: HS256 tokens signed per application
//! - [`error::AuthError`]: the outcome classes the transport layer maps
//!
//! ## Feature Flags
//!
//! - `database`: PostgreSQL store via SQLx, plus the schema migrations
//! - `pg-tests`: PostgreSQL adapter tests (need `DATABASE_URL`)
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sso_core::{
//!     Application, ApplicationId, AuthService, AuthServiceSettings,
//!     InMemoryCredentialStore, SecretHasher, TokenIssuer,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryCredentialStore::new()
//!     .with_application(Application::new(ApplicationId(1), "web", "app-secret"));
//! let service = AuthService::new(
//!     Arc::new(store),
//!     Arc::new(SecretHasher::new("pepper")?),
//!     TokenIssuer::new(),
//!     AuthServiceSettings::default(),
//! );
//!
//! service.register("a@x.com", "pw123456").await?;
//! let token = service.login("a@x.com", "pw123456", ApplicationId(1)).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

pub mod crypto;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
pub mod token;

pub use crypto::{HashError, HashingParams, SecretHasher};
pub use domain::{Application, ApplicationId, Identity, IdentityId};
pub use error::{AuthError, AuthResult};
pub use service::{AuthService, AuthServiceSettings};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError, StoreResult};
#[cfg(feature = "database")]
pub use store::{PostgresCredentialStore, connect_pool};
pub use token::{TokenClaims, TokenError, TokenIssuer};

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
