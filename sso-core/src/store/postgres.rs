use async_trait::async_trait;
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use std::{fmt, time::Duration};

use super::{CredentialStore, StoreError, StoreResult};
use crate::domain::{Application, ApplicationId, Identity, IdentityId};

const UNIQUE_VIOLATION: &str = "23505";

/// Open a pool against `url`. Connections are acquired per query and
/// returned immediately; acquiring waits at most `acquire_timeout`.
pub async fn connect_pool(
    url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(url)
        .await
}

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresCredentialStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        crate::MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

fn classify(op: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Database(ref db_err)
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            StoreError::AlreadyExists
        }
        other => StoreError::Backend(anyhow::Error::new(other).context(op)),
    }
}

fn identity_from_row(row: &PgRow) -> Result<Identity, sqlx::Error> {
    Ok(Identity {
        id: IdentityId(row.try_get("id")?),
        email: row.try_get("email")?,
        secret_hash: row.try_get("secret_hash")?,
        is_admin: row.try_get("is_admin")?,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn save_identity(&self, email: &str, secret_hash: &str) -> StoreResult<IdentityId> {
        const OP: &str = "storage.postgres.save_identity";

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO identities (email, secret_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(secret_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify(OP, err))?;

        Ok(IdentityId(id))
    }

    async fn identity_by_email(&self, email: &str) -> StoreResult<Identity> {
        const OP: &str = "storage.postgres.identity_by_email";

        let row = sqlx::query(
            r#"
            SELECT id, email, secret_hash, is_admin
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify(OP, err))?;

        identity_from_row(&row).map_err(|err| classify(OP, err))
    }

    async fn is_admin(&self, id: IdentityId) -> StoreResult<bool> {
        const OP: &str = "storage.postgres.is_admin";

        sqlx::query_scalar("SELECT is_admin FROM identities WHERE id = $1")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| classify(OP, err))
    }

    async fn application_by_id(&self, id: ApplicationId) -> StoreResult<Application> {
        const OP: &str = "storage.postgres.application_by_id";

        let row = sqlx::query("SELECT id, name, secret FROM applications WHERE id = $1")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| classify(OP, err))?;

        let decode = || -> Result<Application, sqlx::Error> {
            Ok(Application::new(
                ApplicationId(row.try_get("id")?),
                row.try_get::<String, _>("name")?,
                row.try_get::<String, _>("secret")?,
            ))
        };
        decode().map_err(|err| classify(OP, err))
    }
}
