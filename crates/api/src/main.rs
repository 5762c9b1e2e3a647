use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mongodb::options::ClientOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use callboard_api::{build_router, state::AppState, ws};
use callboard_config::{MongoSettings, Settings};
use callboard_db::indexes::ensure_indexes;
use callboard_services::enrichment::{EnrichmentBackend, HttpEnrichmentBackend};
use callboard_services::recent::{MemoryRecentLog, RecentLog, redis::RedisRecentLog};
use callboard_services::store::{CallStore, MemoryCallStore, MongoCallStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;

    // Both stores are best-effort collaborators: an unreachable backend
    // degrades to the in-memory variant instead of refusing to start.
    let calls: Arc<dyn CallStore> = match connect_mongo(&settings.mongo).await {
        Ok(db) => {
            if let Err(e) = ensure_indexes(&db).await {
                warn!(%e, "Index creation failed");
            }
            info!(database = %settings.mongo.database, "MongoDB connected");
            Arc::new(MongoCallStore::new(&db))
        }
        Err(e) => {
            warn!(%e, "MongoDB unavailable, continuing with in-memory call store");
            Arc::new(MemoryCallStore::default())
        }
    };

    let recent: Arc<dyn RecentLog> = match RedisRecentLog::connect(&settings.redis.url).await {
        Ok(log) => {
            info!("Redis connected");
            Arc::new(log)
        }
        Err(e) => {
            warn!(%e, "Redis unavailable, continuing with in-memory recent log");
            Arc::new(MemoryRecentLog::default())
        }
    };

    let backend: Arc<dyn EnrichmentBackend> =
        Arc::new(HttpEnrichmentBackend::new(&settings.enrichment)?);

    let state = AppState::new(settings, recent, calls, backend);
    state.dedup.spawn_window_clear();
    ws::dispatcher::spawn_event_pump(state.registry.clone(), state.bus.subscribe());

    let addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Callboard API listening");
    info!("Dashboard WebSocket: ws://{addr}/ws/dashboard");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn connect_mongo(settings: &MongoSettings) -> Result<mongodb::Database> {
    let mut options = ClientOptions::parse(&settings.uri).await?;
    options.server_selection_timeout = Some(Duration::from_secs(10));
    let client = mongodb::Client::with_options(options)?;
    let db = client.database(&settings.database);
    // Fail fast here so startup can fall back to the in-memory store.
    db.run_command(bson::doc! { "ping": 1 }).await?;
    Ok(db)
}
