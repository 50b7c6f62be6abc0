//! Configuration library for the SSO service.
//!
//! Values are layered: `.env` is loaded into the process environment first,
//! environment variables then override `sso.toml`, which overrides built-in
//! defaults. Loading yields a typed [`Config`] together with non-fatal
//! [`ConfigWarnings`] for the caller to log.

#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError,
};
pub use models::{
    AuthConfig, Config, ConfigMetadata, DatabaseConfig, ServerConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
