//! # SSO Server
//!
//! Multi-tenant single-sign-on service over gRPC. Loads configuration,
//! connects the credential store, applies migrations and serves `auth.Auth`
//! until SIGINT/SIGTERM.

use anyhow::{Context, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use sso_config::{
    Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, ConfigWarnings,
    loader::{db_url::redact_url, is_default_location},
};
use sso_core::{
    Application, ApplicationId, AuthService, AuthServiceSettings,
    CredentialStore, InMemoryCredentialStore, PostgresCredentialStore,
    SecretHasher, TokenIssuer, connect_pool,
};
use sso_server::app::{GrpcApp, shutdown_signal};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "sso-server")]
#[command(about = "Single-sign-on authentication service over gRPC")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// gRPC port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// gRPC host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Path to sso.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Do not apply database migrations on startup
    #[arg(long, global = true, env = "SSO_SKIP_MIGRATIONS", default_value_t = false)]
    skip_migrations: bool,

    /// Run against a process-local store seeded with one development application
    #[arg(long, global = true, default_value_t = false)]
    memory_store: bool,

    /// Id of the development application seeded by --memory-store
    #[arg(long, global = true, env = "SSO_DEV_APP_ID", default_value_t = 1)]
    dev_app_id: i32,

    /// Signing secret of the development application seeded by --memory-store
    #[arg(long, global = true, env = "SSO_DEV_APP_SECRET", hide_env_values = true)]
    dev_app_secret: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the gRPC API (default)
    Serve,
    /// Load and validate configuration, print the effective values and exit
    CheckConfig,
}

const DEV_APP_SECRET: &str = "sso-dev-app-secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(cli.serve).await,
        Command::CheckConfig => check_config(&cli.serve),
    }
}

fn load_config(args: &ServeArgs) -> anyhow::Result<ConfigLoad> {
    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: args.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    Ok(ConfigLoad { config, warnings })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn,h2=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let ConfigLoad { config, warnings } = load_config(&args)?;

    init_tracing();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    log_warnings(&warnings);

    let hasher = Arc::new(
        SecretHasher::with_params(
            config.auth.password_pepper.as_bytes(),
            config.auth.hashing,
        )
        .context("failed to initialise password hasher")?,
    );

    let store = build_store(&args, &config).await?;

    let settings = AuthServiceSettings {
        token_ttl: chrono::Duration::from_std(config.auth.token_ttl)
            .context("token TTL out of range")?,
        store_timeout: config.auth.store_timeout,
    };
    let service = Arc::new(AuthService::new(
        store,
        hasher,
        TokenIssuer::new(),
        settings,
    ));

    let addr = resolve_bind_address(&config.server.bind_address()).await?;

    GrpcApp::new(service, config.server.request_timeout)
        .run(addr, shutdown_signal())
        .await
}

async fn build_store(
    args: &ServeArgs,
    config: &Config,
) -> anyhow::Result<Arc<dyn CredentialStore>> {
    if args.memory_store {
        let secret = match args.dev_app_secret.clone() {
            Some(secret) => secret,
            None => {
                warn!("SSO_DEV_APP_SECRET not set; using the built-in development signing secret");
                DEV_APP_SECRET.to_string()
            }
        };
        let application = Application::new(ApplicationId(args.dev_app_id), "dev", secret);
        warn!(
            app_id = %application.id,
            "using in-memory credential store; data is lost on exit"
        );
        return Ok(Arc::new(
            InMemoryCredentialStore::new().with_application(application),
        ));
    }

    let url = config.database.url.as_deref().ok_or_else(|| {
        anyhow!("no database configured; set DATABASE_URL or pass --memory-store")
    })?;

    info!(url = %redact_url(url), "connecting to PostgreSQL");
    let pool = connect_pool(
        url,
        config.database.max_connections,
        config.database.acquire_timeout,
    )
    .await
    .context("failed to connect to PostgreSQL")?;
    let store = PostgresCredentialStore::new(pool);

    if args.skip_migrations {
        info!("skipping database migrations");
    } else {
        store.migrate().await.context("failed to apply migrations")?;
        info!("database migrations applied");
    }

    Ok(Arc::new(store))
}

async fn resolve_bind_address(address: &str) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host(address)
        .await
        .with_context(|| format!("failed to resolve bind address {address}"))?
        .next()
        .ok_or_else(|| anyhow!("bind address {address} resolved to nothing"))
}

fn check_config(args: &ServeArgs) -> anyhow::Result<()> {
    let ConfigLoad { config, warnings } = load_config(args)?;

    match &config.metadata.config_path {
        Some(path) if is_default_location(path) => {
            println!("config file:        {} (default location)", path.display())
        }
        Some(path) => println!("config file:        {}", path.display()),
        None => println!("config file:        <none>"),
    }
    println!("env file loaded:    {}", config.metadata.env_file_loaded);
    println!("grpc address:       {}", config.server.bind_address());
    println!("grpc timeout:       {:?}", config.server.request_timeout);
    println!(
        "database url:       {}",
        config
            .database
            .url
            .as_deref()
            .map(redact_url)
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("db max connections: {}", config.database.max_connections);
    println!("db acquire timeout: {:?}", config.database.acquire_timeout);
    println!("token ttl:          {:?}", config.auth.token_ttl);
    println!("store timeout:      {:?}", config.auth.store_timeout);
    println!(
        "password pepper:    {}",
        if config.auth.is_default_pepper() { "<default>" } else { "<set>" }
    );
    println!(
        "argon2id:           m={} KiB, t={}, p={}",
        config.auth.hashing.memory_kib,
        config.auth.hashing.iterations,
        config.auth.hashing.parallelism
    );

    if warnings.is_empty() {
        println!("\nno warnings");
    } else {
        println!();
        for warning in &warnings.items {
            println!("warning: {}", warning.message);
            if let Some(hint) = &warning.hint {
                println!("  hint: {hint}");
            }
        }
    }

    Ok(())
}
