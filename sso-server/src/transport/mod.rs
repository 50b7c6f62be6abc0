//! gRPC transport boundary for `auth.Auth`.

pub mod auth;
pub mod status;
pub mod validation;

pub use auth::AuthGrpcService;
