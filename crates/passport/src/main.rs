//! Passport - credential issuance service

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, ConfigOrigin, LoggingConfig};
use passport_api::{AppState, create_router};
use passport_auth::{AuthService, JwtIssuer};
use passport_db::{Database, NewApplication};

/// Passport - authenticates users and issues per-application session tokens
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "PASSPORT_CONFIG", default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "PASSPORT_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PASSPORT_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server (default)
    Serve,
    /// Apply or revert the database schema
    Migrate {
        #[arg(value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
    /// Grant or revoke admin rights for a user
    GrantAdmin {
        #[arg(long)]
        email: String,
        /// Revoke instead of grant
        #[arg(long)]
        revoke: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MigrateAction {
    Up,
    Down,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, origin) = Config::load(&args.config)?;

    init_logging(&config.logging);

    match origin {
        ConfigOrigin::File => info!("Loaded configuration from {}", args.config),
        ConfigOrigin::Defaults => {
            info!("Config file not found at {}, using defaults", args.config)
        }
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, args.bind, args.port).await,
        Command::Migrate { action } => migrate(&config, action).await,
        Command::GrantAdmin { email, revoke } => grant_admin(&config, &email, !revoke).await,
    }
}

async fn serve(config: Config, bind: Option<String>, port: Option<u16>) -> Result<()> {
    info!("Starting Passport v{}", env!("CARGO_PKG_VERSION"));

    let db = open_database(&config).await?;
    db.migrate_up().await?;

    // Applications are provisioned out-of-band through the config file
    if config.apps.is_empty() {
        warn!("No applications configured; every login will be rejected");
    }
    for app in &config.apps {
        db.upsert_application(NewApplication {
            id: app.id,
            name: app.name.clone(),
            secret: app.secret.as_bytes().to_vec(),
        })
        .await
        .with_context(|| format!("Failed to provision application '{}'", app.name))?;
    }

    let metrics_handle = if config.metrics.enabled {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install metrics recorder")?,
        )
    } else {
        None
    };

    let token_ttl = config.auth.validated_token_ttl();
    let auth = Arc::new(AuthService::new(
        info_span!("auth"),
        Arc::new(db),
        Arc::new(JwtIssuer::new()),
        token_ttl,
    ));
    info!("Token TTL: {}s", token_ttl.as_secs());

    let state = AppState::new(auth, config.server.request_timeout());

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    let bind_addr = bind.unwrap_or(config.server.bind_address);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn migrate(config: &Config, action: MigrateAction) -> Result<()> {
    let db = open_database(config).await?;
    match action {
        MigrateAction::Up => db.migrate_up().await?,
        MigrateAction::Down => db.migrate_down().await?,
    }
    Ok(())
}

async fn grant_admin(config: &Config, email: &str, is_admin: bool) -> Result<()> {
    let db = open_database(config).await?;
    if !db.set_admin(email, is_admin).await? {
        anyhow::bail!("No user registered with email {}", email);
    }
    info!(email = %email, is_admin, "Updated admin flag");
    Ok(())
}

/// Connect to the configured database, creating its directory if needed
async fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    Ok(Database::connect(&config.database.url()).await?)
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
