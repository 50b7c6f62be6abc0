use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{CredentialStore, StoreError, StoreResult};
use crate::domain::{Application, ApplicationId, Identity, IdentityId};

#[derive(Debug)]
struct Inner {
    identities: HashMap<IdentityId, Identity>,
    by_email: HashMap<String, IdentityId>,
    applications: HashMap<ApplicationId, Application>,
    next_id: i64,
}

/// Process-local credential store.
///
/// Used by tests and by `--memory-store` dev runs. Ids start at 1 and the
/// email check-and-insert happens under one write lock, so concurrent
/// registrations of the same email produce exactly one winner.
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                identities: HashMap::new(),
                by_email: HashMap::new(),
                applications: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn with_application(self, application: Application) -> Self {
        self.insert_application(application);
        self
    }

    pub fn insert_application(&self, application: Application) {
        self.inner
            .write()
            .applications
            .insert(application.id, application);
    }

    /// Returns false if the identity does not exist.
    pub fn grant_admin(&self, id: IdentityId) -> bool {
        match self.inner.write().identities.get_mut(&id) {
            Some(identity) => {
                identity.is_admin = true;
                true
            }
            None => false,
        }
    }

    pub fn identity_count(&self) -> usize {
        self.inner.read().identities.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn save_identity(&self, email: &str, secret_hash: &str) -> StoreResult<IdentityId> {
        let mut inner = self.inner.write();
        if inner.by_email.contains_key(email) {
            return Err(StoreError::AlreadyExists);
        }

        let id = IdentityId(inner.next_id);
        inner.next_id += 1;
        inner.by_email.insert(email.to_string(), id);
        inner.identities.insert(
            id,
            Identity {
                id,
                email: email.to_string(),
                secret_hash: secret_hash.to_string(),
                is_admin: false,
            },
        );
        Ok(id)
    }

    async fn identity_by_email(&self, email: &str) -> StoreResult<Identity> {
        let inner = self.inner.read();
        inner
            .by_email
            .get(email)
            .and_then(|id| inner.identities.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn is_admin(&self, id: IdentityId) -> StoreResult<bool> {
        self.inner
            .read()
            .identities
            .get(&id)
            .map(|identity| identity.is_admin)
            .ok_or(StoreError::NotFound)
    }

    async fn application_by_id(&self, id: ApplicationId) -> StoreResult<Application> {
        self.inner
            .read()
            .applications
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}
