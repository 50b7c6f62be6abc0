//! Request shape checks, independent of any business rule.

use regex::Regex;
use sso_core::{ApplicationId, IdentityId};
use std::sync::LazyLock;
use thiserror::Error;

use crate::pb::{IsAdminRequest, LoginRequest, RegisterRequest};

static BARE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^\s@<>(),;:"\[\]]+@[^\s@<>(),;:"\[\]]+$"#)
        .expect("address pattern compiles")
});

static NAMED_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:"[^"]*"|[^<>"]*)\s*<([^<>]+)>$"#)
        .expect("named address pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub email: String,
    pub app_id: ApplicationId,
}

/// Accepts `local@domain` or `Display Name <local@domain>` and returns the
/// bare address. Domains must not start or end with a dot.
pub fn email(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError("email is required"));
    }

    let address = match NAMED_ADDRESS.captures(trimmed) {
        Some(captures) => captures
            .get(1)
            .map(|m| m.as_str().trim())
            .unwrap_or_default(),
        None => trimmed,
    };

    if !BARE_ADDRESS.is_match(address) {
        return Err(ValidationError("email is invalid"));
    }
    let domain = address.rsplit('@').next().unwrap_or_default();
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError("email is invalid"));
    }

    Ok(address.to_string())
}

pub fn secret(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError("password is required"));
    }
    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<ValidLogin, ValidationError> {
    let email = email(&req.email)?;
    secret(&req.password)?;
    if req.app_id == 0 {
        return Err(ValidationError("app_id is required"));
    }
    Ok(ValidLogin {
        email,
        app_id: ApplicationId(req.app_id),
    })
}

/// Returns the normalized email.
pub fn validate_register(req: &RegisterRequest) -> Result<String, ValidationError> {
    let email = email(&req.email)?;
    secret(&req.password)?;
    Ok(email)
}

pub fn validate_is_admin(req: &IsAdminRequest) -> Result<IdentityId, ValidationError> {
    if req.user_id == 0 {
        return Err(ValidationError("user_id is required"));
    }
    Ok(IdentityId(req.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_and_named_addresses() {
        assert_eq!(email("a@x.com").unwrap(), "a@x.com");
        assert_eq!(email("  a@x.com ").unwrap(), "a@x.com");
        assert_eq!(email("Alice <alice@example.org>").unwrap(), "alice@example.org");
        assert_eq!(
            email("\"Smith, Bob\" <bob@example.org>").unwrap(),
            "bob@example.org"
        );
    }

    #[test]
    fn rejects_missing_or_malformed_addresses() {
        for raw in ["", " ", "\t"] {
            assert_eq!(email(raw), Err(ValidationError("email is required")));
        }
        for raw in [
            "plainaddress",
            "@x.com",
            "a@",
            "a@@x.com",
            "a b@x.com",
            "a@x..com",
            "a@.x.com",
            "Alice <>",
            "<a@x.com",
        ] {
            assert_eq!(email(raw), Err(ValidationError("email is invalid")), "{raw}");
        }
    }

    #[test]
    fn whitespace_only_secret_is_missing() {
        assert!(secret("pw").is_ok());
        assert!(secret(" pw ").is_ok());
        for raw in ["", " ", "  \n\t"] {
            assert_eq!(secret(raw), Err(ValidationError("password is required")));
        }
    }

    #[test]
    fn zero_ids_are_missing() {
        let login = LoginRequest {
            email: "a@x.com".into(),
            password: "pw".into(),
            app_id: 0,
        };
        assert_eq!(
            validate_login(&login),
            Err(ValidationError("app_id is required"))
        );

        assert_eq!(
            validate_is_admin(&IsAdminRequest { user_id: 0 }),
            Err(ValidationError("user_id is required"))
        );
        assert_eq!(
            validate_is_admin(&IsAdminRequest { user_id: 7 }),
            Ok(IdentityId(7))
        );
    }

    #[test]
    fn login_normalizes_named_address() {
        let login = LoginRequest {
            email: "Alice <alice@x.com>".into(),
            password: "pw".into(),
            app_id: -3,
        };
        let valid = validate_login(&login).unwrap();
        assert_eq!(valid.email, "alice@x.com");
        assert_eq!(valid.app_id, ApplicationId(-3));
    }
}
