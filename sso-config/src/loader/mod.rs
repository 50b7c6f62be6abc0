pub mod db_url;
pub mod error;

use sso_core::HashingParams;
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::{
    constants::{
        DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_CONFIG_LOCATIONS, DEFAULT_DATABASE_PORT,
        DEFAULT_GRPC_HOST, DEFAULT_GRPC_PORT, DEFAULT_MAX_CONNECTIONS,
        DEFAULT_PASSWORD_PEPPER, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SSL_MODE,
        DEFAULT_STORE_TIMEOUT, DEFAULT_TOKEN_TTL,
    },
    models::{
        AuthConfig, Config, ConfigMetadata, DatabaseConfig, ServerConfig,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigWarnings},
};
use db_url::{DatabaseParts, resolve_database_url};
use error::ConfigLoadError;

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` into the process environment, then compose the
    /// configuration from the environment and the config file.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose from an explicit environment snapshot. Does not read `.env`.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        self.compose_config(file_config, env, config_path)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| {
            ConfigLoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if file_config.is_none() {
            warnings.push_with_hint(
                "No sso.toml detected; using environment variables and defaults",
                "Pass --config or set SSO_CONFIG_PATH to use a configuration file",
            );
        }

        let FileConfig {
            server: file_server,
            database: file_database,
            auth: file_auth,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .grpc_host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_GRPC_HOST.to_string()),
            port: parse_number("SSO_GRPC_PORT", env.grpc_port.as_deref())?
                .or(file_server.port)
                .unwrap_or(DEFAULT_GRPC_PORT),
            request_timeout: layered_duration(
                ("SSO_GRPC_TIMEOUT", env.grpc_timeout.as_deref()),
                ("server.request_timeout", file_server.request_timeout.as_deref()),
            )?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        };

        let parts = DatabaseParts {
            url: env.database_url.clone().or(file_database.url),
            host: env.database_host.clone().or(file_database.host),
            port: parse_number("DATABASE_PORT", env.database_port.as_deref())?
                .or(file_database.port)
                .unwrap_or(DEFAULT_DATABASE_PORT),
            user: env.database_user.clone().or(file_database.user),
            password: env.database_password.clone().or(file_database.password),
            password_file: env
                .database_password_file
                .clone()
                .or(file_database.password_file),
            name: env.database_name.clone().or(file_database.name),
            ssl_mode: env
                .database_ssl_mode
                .clone()
                .or(file_database.ssl_mode)
                .unwrap_or_else(|| DEFAULT_SSL_MODE.to_string()),
        };

        let database = DatabaseConfig {
            url: resolve_database_url(&parts)?,
            max_connections: parse_number(
                "DATABASE_MAX_CONNECTIONS",
                env.database_max_connections.as_deref(),
            )?
            .or(file_database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: layered_duration(
                ("DATABASE_ACQUIRE_TIMEOUT", env.database_acquire_timeout.as_deref()),
                ("database.acquire_timeout", file_database.acquire_timeout.as_deref()),
            )?
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT),
        };

        let hashing = HashingParams {
            memory_kib: parse_number(
                "AUTH_HASH_MEMORY_KIB",
                env.hash_memory_kib.as_deref(),
            )?
            .or(file_auth.hashing.memory_kib)
            .unwrap_or(HashingParams::DEFAULT_MEMORY_KIB),
            iterations: parse_number(
                "AUTH_HASH_ITERATIONS",
                env.hash_iterations.as_deref(),
            )?
            .or(file_auth.hashing.iterations)
            .unwrap_or(HashingParams::DEFAULT_ITERATIONS),
            parallelism: parse_number(
                "AUTH_HASH_PARALLELISM",
                env.hash_parallelism.as_deref(),
            )?
            .or(file_auth.hashing.parallelism)
            .unwrap_or(HashingParams::DEFAULT_PARALLELISM),
        };

        let auth = AuthConfig {
            password_pepper: env
                .auth_password_pepper
                .clone()
                .or(file_auth.password_pepper)
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
            token_ttl: layered_duration(
                ("SSO_TOKEN_TTL", env.token_ttl.as_deref()),
                ("auth.token_ttl", file_auth.token_ttl.as_deref()),
            )?
            .unwrap_or(DEFAULT_TOKEN_TTL),
            store_timeout: layered_duration(
                ("SSO_STORE_TIMEOUT", env.store_timeout.as_deref()),
                ("auth.store_timeout", file_auth.store_timeout.as_deref()),
            )?
            .unwrap_or(DEFAULT_STORE_TIMEOUT),
            hashing,
        };

        let config = Config {
            server,
            database,
            auth,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded: false,
            },
        };

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }
}

fn parse_number<T>(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ConfigLoadError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|err: T::Err| ConfigLoadError::InvalidValue {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            })
    })
    .transpose()
}

fn parse_duration(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<Duration>, ConfigLoadError> {
    raw.map(|value| {
        humantime::parse_duration(value.trim()).map_err(|err| {
            ConfigLoadError::InvalidValue {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            }
        })
    })
    .transpose()
}

/// Env value first, then file value. Both are parsed so a bad file value is
/// reported even while the environment overrides it.
fn layered_duration(
    env: (&'static str, Option<&str>),
    file: (&'static str, Option<&str>),
) -> Result<Option<Duration>, ConfigLoadError> {
    let from_env = parse_duration(env.0, env.1)?;
    let from_file = parse_duration(file.0, file.1)?;
    Ok(from_env.or(from_file))
}

/// Whether a path looks like one of the default config locations. Used by
/// `check-config` output.
pub fn is_default_location(path: &Path) -> bool {
    DEFAULT_CONFIG_LOCATIONS
        .iter()
        .any(|candidate| Path::new(candidate) == path)
}
