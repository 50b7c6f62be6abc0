use std::time::Duration;

/// Placeholder pepper used when none is configured. Fine for local runs,
/// flagged as a warning at startup.
pub const DEFAULT_PASSWORD_PEPPER: &str = "sso-dev-pepper-change-me";

pub const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["sso.toml", "config/sso.toml"];

pub const DEFAULT_GRPC_HOST: &str = "0.0.0.0";
pub const DEFAULT_GRPC_PORT: u16 = 44044;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_DATABASE_PORT: u16 = 5432;
pub const DEFAULT_SSL_MODE: &str = "prefer";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// libpq `sslmode` values.
pub const SSL_MODES: [&str; 6] = [
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];
