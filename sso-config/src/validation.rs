use std::time::Duration;
use thiserror::Error;

use crate::{
    constants::MAX_TOKEN_TTL,
    models::{AuthConfig, Config},
};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },
    #[error("{field} must not exceed {max:?}")]
    TooLarge { field: &'static str, max: Duration },
    #[error("invalid password hashing parameters: {reason}")]
    InvalidHashing { reason: String },
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    ensure_positive("SSO_GRPC_TIMEOUT", config.server.request_timeout)?;
    ensure_positive("DATABASE_ACQUIRE_TIMEOUT", config.database.acquire_timeout)?;
    ensure_positive("SSO_TOKEN_TTL", config.auth.token_ttl)?;
    ensure_positive("SSO_STORE_TIMEOUT", config.auth.store_timeout)?;
    if config.auth.token_ttl > MAX_TOKEN_TTL {
        return Err(ConfigGuardRailError::TooLarge {
            field: "SSO_TOKEN_TTL",
            max: MAX_TOKEN_TTL,
        });
    }
    if config.database.max_connections == 0 {
        return Err(ConfigGuardRailError::NonPositive {
            field: "DATABASE_MAX_CONNECTIONS",
        });
    }

    config.auth.hashing.validate().map_err(|err| {
        ConfigGuardRailError::InvalidHashing {
            reason: err.to_string(),
        }
    })?;

    check_pepper(&config.auth, &mut warnings)?;

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "No database configured; only in-memory runs are possible",
            "Set DATABASE_URL or DATABASE_HOST/DATABASE_USER/DATABASE_NAME",
        );
    }

    if config.auth.store_timeout > config.server.request_timeout {
        warnings.push(
            "SSO_STORE_TIMEOUT exceeds SSO_GRPC_TIMEOUT; slow store calls will be cut off by the request deadline first",
        );
    }

    Ok(warnings)
}

fn ensure_positive(
    field: &'static str,
    value: Duration,
) -> Result<(), ConfigGuardRailError> {
    if value.is_zero() {
        return Err(ConfigGuardRailError::NonPositive { field });
    }
    Ok(())
}

fn check_pepper(
    auth: &AuthConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    const MIN_PEPPER_LENGTH: usize = 16;

    if auth.password_pepper.is_empty() {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_PASSWORD_PEPPER",
            reason: "must not be empty".into(),
        });
    }

    if auth.is_default_pepper() {
        warnings.push_with_hint(
            "AUTH_PASSWORD_PEPPER uses the built-in development value",
            "Set a random AUTH_PASSWORD_PEPPER before storing real accounts; changing it later invalidates every stored hash",
        );
    } else if auth.password_pepper.len() < MIN_PEPPER_LENGTH {
        warnings.push(format!(
            "AUTH_PASSWORD_PEPPER is shorter than {MIN_PEPPER_LENGTH} bytes"
        ));
    }

    Ok(())
}
