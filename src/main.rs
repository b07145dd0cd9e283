use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notes_api::config::{config, StorageBackend};
use notes_api::database::{DatabaseManager, Store};
use notes_api::state::AppState;

/// Notes REST API server
#[derive(Parser, Debug)]
#[command(name = "notes-api", version, about)]
struct Cli {
    /// Port to listen on (overrides API_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Storage backend: postgres or memory (overrides DATABASE_BACKEND)
    #[arg(long)]
    storage: Option<StorageBackend>,

    /// Do not create the schema on startup
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notes_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut app_config = config().clone();
    if let Some(port) = cli.port {
        app_config.api.port = port;
    }
    if let Some(backend) = cli.storage {
        app_config.database.backend = backend;
    }

    tracing::info!(
        "Starting notes-api in {:?} mode with {:?} storage",
        app_config.environment,
        app_config.database.backend
    );

    let store = match app_config.database.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&app_config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            if cli.skip_migrations {
                tracing::info!("Skipping schema setup");
            } else {
                DatabaseManager::migrate(&pool).await.context("failed to apply schema")?;
            }
            Store::postgres(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Store::memory()
        }
    };

    let bind_addr = format!("0.0.0.0:{}", app_config.api.port);
    let app = notes_api::app(AppState::new(store, app_config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
