//! Domain outcome to gRPC status mapping.

use sso_core::AuthError;
use tonic::Status;
use tracing::error;

use super::validation::ValidationError;

pub const INTERNAL_MESSAGE: &str = "internal error";

impl From<ValidationError> for Status {
    fn from(err: ValidationError) -> Self {
        Status::invalid_argument(err.0)
    }
}

/// Map a service error to the status returned to the caller.
///
/// Internal causes are logged here and never leave the process.
pub fn auth_status(err: AuthError) -> Status {
    lookup_status(err, "not found")
}

/// Like [`auth_status`] for operations that look a record up; `not_found`
/// names the missing record.
pub fn lookup_status(err: AuthError, not_found: &'static str) -> Status {
    match err {
        AuthError::Validation(reason) => Status::invalid_argument(reason),
        AuthError::InvalidCredentials => {
            Status::invalid_argument("invalid credentials")
        }
        AuthError::AlreadyExists => Status::already_exists("user already exists"),
        AuthError::NotFound => Status::not_found(not_found),
        AuthError::Internal { op, source } => {
            error!(op, error = ?source, "request failed");
            Status::internal(INTERNAL_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn maps_each_outcome_class() {
        let cases = [
            (AuthError::Validation("password is required"), Code::InvalidArgument),
            (AuthError::InvalidCredentials, Code::InvalidArgument),
            (AuthError::AlreadyExists, Code::AlreadyExists),
            (AuthError::NotFound, Code::NotFound),
            (
                AuthError::internal("auth.login", anyhow::anyhow!("db down")),
                Code::Internal,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(auth_status(err).code(), code);
        }
    }

    #[test]
    fn internal_detail_is_not_forwarded() {
        let status = auth_status(AuthError::internal(
            "auth.register",
            anyhow::anyhow!("password for sso@db rejected"),
        ));
        assert_eq!(status.message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn lookup_names_the_missing_record() {
        let status = lookup_status(AuthError::NotFound, "application not found");
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "application not found");

        let status = auth_status(AuthError::NotFound);
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "not found");
    }

    #[test]
    fn validation_error_becomes_invalid_argument() {
        let status: Status = ValidationError("email is required").into();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "email is required");
    }
}
