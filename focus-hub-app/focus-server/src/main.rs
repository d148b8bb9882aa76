use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use focus_api::{build_router, AppState, HistoryCache};
use focus_core::ports::{DurableStore, FastStore};
use focus_core::HistoryCacheConfig;
use focus_infrastructure::{
    create_pool, run_migrations, MemoryConversationStore, MemoryHistoryCache,
    PgConversationStore, RedisHistoryCache,
};
use focus_shared::config::{AppConfig, DurableBackend, FastBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize telemetry
    focus_shared::telemetry::init_telemetry(&config.logging)?;

    info!("{} starting (env={})...", config.app.name, config.app.env);

    let durable = durable_store(&config).await?;
    let fast = fast_store(&config)?;

    let history_config = HistoryCacheConfig::try_from(&config.history)?;
    let history = Arc::new(HistoryCache::new(durable, fast, history_config));

    let report = history.health().await;
    if !report.fast {
        warn!("Fast store unreachable at startup; reads will fall back to the durable store");
    }

    // Build router
    let app = build_router(AppState::new(history));

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn durable_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DurableStore>> {
    match config.database.backend {
        DurableBackend::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(config.database.acquire_timeout_seconds),
            )
            .await
            .context("Failed to connect to database")?;

            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database connection established.");

            Ok(Arc::new(PgConversationStore::new(pool)))
        }
        DurableBackend::Memory => {
            warn!("Using in-memory durable store; history is lost on restart");
            Ok(Arc::new(MemoryConversationStore::new()))
        }
    }
}

fn fast_store(config: &AppConfig) -> anyhow::Result<Arc<dyn FastStore>> {
    match config.redis.backend {
        FastBackend::Redis => {
            let cache = RedisHistoryCache::new(
                &config.redis.url,
                config.redis.max_connections,
                config.redis.key_prefix.clone(),
            )?;
            Ok(Arc::new(cache))
        }
        FastBackend::Memory => Ok(Arc::new(MemoryHistoryCache::new())),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
