//! Persistence of identities and applications.
//!
//! The authentication service depends only on [`CredentialStore`]; backends
//! are swappable. A uniqueness violation on email must always surface as
//! [`StoreError::AlreadyExists`], distinct from any other failure.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Application, ApplicationId, Identity, IdentityId};

mod memory;
#[cfg(feature = "database")]
mod postgres;

pub use memory::InMemoryCredentialStore;
#[cfg(feature = "database")]
pub use postgres::{PostgresCredentialStore, connect_pool};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("record not found")]
    NotFound,
    #[error("store operation timed out")]
    Timeout,
    #[error("store backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new identity. Fails `AlreadyExists` if the email is taken.
    async fn save_identity(&self, email: &str, secret_hash: &str) -> StoreResult<IdentityId>;

    async fn identity_by_email(&self, email: &str) -> StoreResult<Identity>;

    async fn is_admin(&self, id: IdentityId) -> StoreResult<bool>;

    async fn application_by_id(&self, id: ApplicationId) -> StoreResult<Application>;
}
