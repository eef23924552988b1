mod config;
mod db;
mod errors;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::matching::engine::{EngineSettings, MatchEngine};
use crate::matching::notifier::{LogNotifier, NotificationPolicy, Notifier, WebhookNotifier};
use crate::matching::pg_store::PgStore;
use crate::matching::triggers::MatchDispatcher;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matchmaker API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&db).await?;
    let store = Arc::new(PgStore::new(db));

    // Matching engine
    let settings = EngineSettings {
        persist_concurrency: config.persist_concurrency,
        ..EngineSettings::default()
    };
    let engine = Arc::new(MatchEngine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        settings,
    ));
    info!(
        persist_concurrency = settings.persist_concurrency,
        min_score = settings.limits.min_score,
        weight_total = settings.weights.sum(),
        "Match engine initialized"
    );

    // Notifications go to the webhook when one is configured
    let notifier: Arc<dyn Notifier> = match &config.notification_webhook_url {
        Some(url) => {
            info!("Notifications delivered to webhook");
            Arc::new(WebhookNotifier::new(url.clone())?)
        }
        None => {
            info!("NOTIFICATION_WEBHOOK_URL not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let dispatcher = MatchDispatcher::new(
        engine,
        store.clone(),
        store.clone(),
        notifier,
        NotificationPolicy::default(),
        config.max_concurrent_batches,
    );

    // Build app state
    let state = AppState {
        matches: store,
        dispatcher,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
