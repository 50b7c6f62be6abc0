//! Self-contained bearer tokens.
//!
//! Tokens are HS256 JWTs signed with the secret of the application they were
//! issued for. Any holder of that secret can verify one offline; nothing is
//! persisted and there is no revocation list.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Application, ApplicationId, Identity, IdentityId};

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub uid: IdentityId,
    pub email: String,
    pub app_id: ApplicationId,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token lifetime must be positive")]
    NonPositiveTtl,
    #[error("token lifetime pushes expiry past the representable range")]
    TtlOutOfRange,
    #[error("application {0} has no signing secret")]
    MissingSecret(ApplicationId),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token was issued for application {found}, expected {expected}")]
    ApplicationMismatch {
        expected: ApplicationId,
        found: ApplicationId,
    },
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies tokens bound to (identity, application, expiry).
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self {
            algorithm: Algorithm::HS256,
        }
    }

    pub fn issue(
        &self,
        identity: &Identity,
        application: &Application,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::NonPositiveTtl);
        }
        if application.secret().is_empty() {
            return Err(TokenError::MissingSecret(application.id));
        }

        let iat = issued_at.timestamp();
        // Whole seconds on the wire; keep exp strictly after iat.
        let exp = issued_at
            .checked_add_signed(ttl)
            .ok_or(TokenError::TtlOutOfRange)?
            .timestamp()
            .max(iat + 1);

        let claims = TokenClaims {
            uid: identity.id,
            email: identity.email.clone(),
            app_id: application.id,
            iat,
            exp,
        };

        encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(application.secret().as_bytes()),
        )
        .map_err(|err| TokenError::Signing(err.to_string()))
    }

    /// Check signature, audience and expiry. `exp <= now` is rejected.
    pub fn verify(
        &self,
        token: &str,
        application: &Application,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        if application.secret().is_empty() {
            return Err(TokenError::MissingSecret(application.id));
        }

        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the caller's clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(application.secret().as_bytes()),
            &validation,
        )
        .map_err(|err| match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(err.to_string()),
        })?;

        let claims = data.claims;
        if claims.app_id != application.id {
            return Err(TokenError::ApplicationMismatch {
                expected: application.id,
                found: claims.app_id,
            });
        }
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
