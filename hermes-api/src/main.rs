use std::net::SocketAddr;

use anyhow::Context;
use hermes_api::{app, AppState, AuthConfig};
use hermes_store::{app_config::Config, DbClient, StorageBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hermes_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Hermes API on port {}", config.server.port);

    let auth = AuthConfig::from(&config.auth);
    let app_state = match config.database.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            AppState::postgres(&db, auth)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory backend; data is lost on restart");
            AppState::in_memory(auth)
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
