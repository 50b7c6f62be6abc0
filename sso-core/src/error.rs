use thiserror::Error;

use crate::crypto::HashError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Outcome classes of the authentication service.
///
/// `Internal` keeps its cause for server-side logging; callers outside the
/// core only ever see the kind.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("already exists")]
    AlreadyExists,
    #[error("not found")]
    NotFound,
    #[error("internal error in {op}")]
    Internal {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AuthError {
    pub fn internal(op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            op,
            source: source.into(),
        }
    }

    /// Classify a store failure. `AlreadyExists` and `NotFound` keep their
    /// meaning; everything else becomes `Internal`.
    pub fn from_store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => Self::AlreadyExists,
            StoreError::NotFound => Self::NotFound,
            other => Self::internal(op, other),
        }
    }

    pub fn from_hash(op: &'static str, err: HashError) -> Self {
        Self::internal(op, err)
    }

    pub fn from_token(op: &'static str, err: TokenError) -> Self {
        Self::internal(op, err)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::Internal { .. } => "internal",
        }
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_domain_meaning() {
        assert!(matches!(
            AuthError::from_store("op", StoreError::AlreadyExists),
            AuthError::AlreadyExists
        ));
        assert!(matches!(
            AuthError::from_store("op", StoreError::NotFound),
            AuthError::NotFound
        ));
        let err = AuthError::from_store("auth.login", StoreError::Timeout);
        assert_eq!(err.kind(), "internal");
        assert_eq!(err.to_string(), "internal error in auth.login");
    }
}
