use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file. Durations are humantime
/// strings such as `"10s"` or `"1h 30m"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_pepper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_timeout: Option<String>,
    #[serde(default)]
    pub hashing: FileHashingConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileHashingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kib: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Environment-derived configuration values, kept as raw strings until the
/// loader parses them so a bad value can be reported with its key.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub grpc_host: Option<String>,
    pub grpc_port: Option<String>,
    pub grpc_timeout: Option<String>,
    pub database_url: Option<String>,
    pub database_host: Option<String>,
    pub database_port: Option<String>,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    pub database_password_file: Option<PathBuf>,
    pub database_name: Option<String>,
    pub database_ssl_mode: Option<String>,
    pub database_max_connections: Option<String>,
    pub database_acquire_timeout: Option<String>,
    pub token_ttl: Option<String>,
    pub store_timeout: Option<String>,
    pub auth_password_pepper: Option<String>,
    pub hash_memory_kib: Option<String>,
    pub hash_iterations: Option<String>,
    pub hash_parallelism: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            config_path: var("SSO_CONFIG_PATH").map(PathBuf::from),
            grpc_host: var("SSO_GRPC_HOST"),
            grpc_port: var("SSO_GRPC_PORT"),
            grpc_timeout: var("SSO_GRPC_TIMEOUT"),
            database_url: var("DATABASE_URL"),
            database_host: var("DATABASE_HOST"),
            database_port: var("DATABASE_PORT"),
            database_user: var("DATABASE_USER"),
            database_password: var("DATABASE_PASSWORD"),
            database_password_file: var("DATABASE_PASSWORD_FILE")
                .map(PathBuf::from),
            database_name: var("DATABASE_NAME"),
            database_ssl_mode: var("DATABASE_SSLMODE"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS"),
            database_acquire_timeout: var("DATABASE_ACQUIRE_TIMEOUT"),
            token_ttl: var("SSO_TOKEN_TTL"),
            store_timeout: var("SSO_STORE_TIMEOUT"),
            auth_password_pepper: var("AUTH_PASSWORD_PEPPER"),
            hash_memory_kib: var("AUTH_HASH_MEMORY_KIB"),
            hash_iterations: var("AUTH_HASH_ITERATIONS"),
            hash_parallelism: var("AUTH_HASH_PARALLELISM"),
        }
    }
}
