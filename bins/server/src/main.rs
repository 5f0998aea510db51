//! Khata API Server
//!
//! Main entry point for the Khata invoicing service.
//!
//! Usage:
//!   khata                 - Serve the API
//!   khata token <email>   - Print a signed access token for local development

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use khata_api::{AppState, create_router};
use khata_db::{DocumentStore, MemoryDocumentStore, PgDocumentStore, connect};
use khata_shared::config::{LogFormat, StoreBackend};
use khata_shared::{AppConfig, JwtConfig, JwtService, OwnerKey};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.log.format);

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => serve(config, jwt_service).await,
        Some("token") => {
            let email = args.next().context("usage: khata token <email>")?;
            let owner = OwnerKey::parse(&email)?;
            println!("{}", jwt_service.generate_access_token(&owner)?);
            Ok(())
        }
        Some(other) => bail!("unknown command '{other}'"),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "khata=debug,khata_api=debug,khata_db=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

async fn serve(config: AppConfig, jwt_service: JwtService) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory document store; data is lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url()
                .context("database.url is required for the postgres store")?;
            let db = connect(
                url,
                config.database.max_connections,
                config.database.min_connections,
            )
            .await?;
            info!("Connected to database");
            Arc::new(PgDocumentStore::new(db))
        }
    };

    let state = AppState {
        store,
        jwt_service: Arc::new(jwt_service),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(backend = ?config.store.backend, "Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received terminate signal"),
    }
}
