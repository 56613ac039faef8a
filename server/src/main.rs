// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

//! # Petshop Server
//!
//! The `petshop-server` binary hosts the pet registry HTTP API.
//!
//! ## Commands
//!
//! - `petshop-server` (or `petshop-server serve`) - Run the HTTP service
//! - `petshop-server mint-token --sub <subject>` - Mint a signed credential
//!   for exercising the API by hand
//!
//! Configuration is discovered from `PETSHOP_CONFIG_PATH`, then
//! `./petshop-config.yaml`, then `/etc/petshop/config.yaml`, with
//! environment overrides applied on top.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use petshop_server::{
    application::MutationCoordinator,
    domain::identity::Identity,
    domain::repository::{AuditTrailRecorder, PetRepository, StorageBackend},
    infrastructure::{
        auth::{AuthResolver, AuthTokenVerifier},
        db::Database,
        repositories::{
            InMemoryAuditTrail, InMemoryPetRepository, PostgresAuditTrail, PostgresPetRepository,
        },
        ServiceConfig,
    },
    presentation::api::{app, AppState},
};

/// Petshop Server - Pet registry with a signed-credential auth context
#[derive(Parser)]
#[command(name = "petshop-server")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "PETSHOP_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API host (overrides config)
    #[arg(long, global = true, env = "PETSHOP_HOST")]
    host: Option<String>,

    /// HTTP API port (overrides config)
    #[arg(long, global = true, env = "PETSHOP_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PETSHOP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default when no command is given)
    Serve,

    /// Mint a signed credential for manual testing
    MintToken {
        /// Subject claim for the credential
        #[arg(long)]
        sub: String,

        /// Credential lifetime in seconds
        #[arg(long, default_value = "3600")]
        ttl_secs: i64,

        /// Extra claim as key=value (repeatable); values parse as JSON,
        /// falling back to a plain string
        #[arg(long = "claim", value_name = "KEY=VALUE")]
        claims: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    let mut config = ServiceConfig::load_or_default(cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    match cli.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::MintToken {
            sub,
            ttl_secs,
            claims,
        }) => mint_token(&config, sub, ttl_secs, &claims),
    }
}

async fn serve(config: ServiceConfig) -> Result<()> {
    let verifier = Arc::new(AuthTokenVerifier::new(&config.auth.secret));
    let resolver = AuthResolver::new(
        verifier,
        &config.auth.cookie_name,
        config.auth.cookie_max_age_secs,
    );

    let (pets, audit): (Arc<dyn PetRepository>, Arc<dyn AuditTrailRecorder>) =
        match config.primary_backend() {
            StorageBackend::PostgreSQL(pg) => {
                let primary = Database::new(&pg.connection_string)
                    .await
                    .context("Failed to connect to primary database")?;
                primary.migrate().await?;

                // A dedicated audit database gets its own pool and schema;
                // otherwise the audit trail shares the primary.
                let audit_db = match config.storage.audit_database_url.as_deref() {
                    Some(url) if url != pg.connection_string.as_str() => {
                        let db = Database::new(url)
                            .await
                            .context("Failed to connect to audit database")?;
                        db.migrate().await?;
                        db
                    }
                    _ => primary.clone(),
                };

                let pets: Arc<dyn PetRepository> =
                    Arc::new(PostgresPetRepository::new(primary.get_pool().clone()));
                let audit: Arc<dyn AuditTrailRecorder> =
                    Arc::new(PostgresAuditTrail::new(audit_db.get_pool().clone()));
                (pets, audit)
            }
            StorageBackend::InMemory => {
                warn!("No database configured; using in-memory storage");
                let pets: Arc<dyn PetRepository> = Arc::new(InMemoryPetRepository::new());
                let audit: Arc<dyn AuditTrailRecorder> = Arc::new(InMemoryAuditTrail::new());
                (pets, audit)
            }
        };

    let state = AppState {
        pets: pets.clone(),
        mutations: Arc::new(MutationCoordinator::new(pets, audit)),
        auth: resolver,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Pet registry listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutting down");

    Ok(())
}

fn mint_token(config: &ServiceConfig, sub: String, ttl_secs: i64, claims: &[String]) -> Result<()> {
    let mut identity = Identity::new(sub, ttl_secs);
    for claim in claims {
        let Some((key, value)) = claim.split_once('=') else {
            anyhow::bail!("Invalid claim '{}': expected KEY=VALUE", claim);
        };
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        identity.extra.insert(key.to_string(), value);
    }

    let verifier = AuthTokenVerifier::new(&config.auth.secret);
    let token = verifier
        .sign(&identity)
        .context("Failed to sign credential")?;
    println!("{}", token);
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
