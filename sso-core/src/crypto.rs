use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

/// Argon2id work factor. Memory is in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingParams {
    /// Recommended defaults target ~64 MiB memory and 3 iterations which is a
    /// solid baseline for servers without dedicated tuning.
    pub const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    pub const DEFAULT_ITERATIONS: u32 = 3;
    pub const DEFAULT_PARALLELISM: u32 = 1;

    /// Cheapest parameters Argon2 accepts. Only for tests.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    fn build(self) -> Result<Params, HashError> {
        ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|err| HashError::InvalidParams(err.to_string()))
    }

    /// Check the parameters without building a hasher.
    pub fn validate(self) -> Result<(), HashError> {
        self.build().map(|_| ())
    }
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            iterations: Self::DEFAULT_ITERATIONS,
            parallelism: Self::DEFAULT_PARALLELISM,
        }
    }
}

/// Argon2id hashing of account secrets with a random salt and a server-side
/// pepper.
///
/// Hashing is CPU bound and deliberately slow. The `*_blocking` async
/// wrappers move the work onto tokio's blocking pool so one request cannot
/// stall the async workers serving others.
#[derive(Debug)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
    pepper: Zeroizing<Vec<u8>>,
    dummy_hash: String,
}

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password pepper must not be empty")]
    EmptyPepper,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("hashing task failed: {0}")]
    Join(String),
}

impl From<PasswordHashError> for HashError {
    fn from(err: PasswordHashError) -> Self {
        HashError::PasswordHash(err.to_string())
    }
}

impl SecretHasher {
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;

    /// Build a hasher with default Argon2id parameters.
    pub fn new(pepper: impl AsRef<[u8]>) -> Result<Self, HashError> {
        Self::with_params(pepper, HashingParams::default())
    }

    pub fn with_params(
        pepper: impl AsRef<[u8]>,
        params: HashingParams,
    ) -> Result<Self, HashError> {
        let pepper = pepper.as_ref();
        if pepper.is_empty() {
            return Err(HashError::EmptyPepper);
        }

        let argon2 =
            Argon2::new(Algorithm::Argon2id, Version::default(), params.build()?);

        let mut hasher = Self {
            argon2,
            pepper: Zeroizing::new(pepper.to_vec()),
            dummy_hash: String::new(),
        };
        // Same parameters as real hashes, so a miss costs as much as a hit.
        hasher.dummy_hash = hasher.hash("sso-dummy-secret")?;
        Ok(hasher)
    }

    fn peppered(&self, secret: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(
            secret.len() + self.pepper.len(),
        ));
        material.extend_from_slice(secret.as_bytes());
        material.extend_from_slice(&self.pepper);
        material
    }

    /// Hash a secret. The resulting PHC string is suitable for storage.
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let material = self.peppered(secret);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| HashError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;
        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    /// Verify a secret against a stored hash. Comparison is constant time.
    pub fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored_hash)?;
        let material = self.peppered(secret);
        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    /// Burn one verification's worth of work against a hash nobody owns.
    pub fn verify_dummy(&self, secret: &str) -> Result<bool, HashError> {
        self.verify(secret, &self.dummy_hash).map(|_| false)
    }

    pub async fn hash_blocking(
        self: &Arc<Self>,
        secret: Zeroizing<String>,
    ) -> Result<String, HashError> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|err| HashError::Join(err.to_string()))?
    }

    /// `stored_hash` of `None` runs the dummy comparison and reports a miss.
    pub async fn verify_blocking(
        self: &Arc<Self>,
        secret: Zeroizing<String>,
        stored_hash: Option<String>,
    ) -> Result<bool, HashError> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&secret, &hash),
            None => hasher.verify_dummy(&secret),
        })
        .await
        .map_err(|err| HashError::Join(err.to_string()))?
    }
}
