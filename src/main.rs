use sea_orm::{ConnectOptions, Database};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hrsearch::{AppConfig, AppState, RateLimiter, SearchEngine, router};

const CONFIG_ENV: &str = "HRSEARCH_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV))
        .map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let mut options = ConnectOptions::new(config.database.url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;

    let text_match = config.database.text_search.resolve(&db).await?;
    tracing::info!(?text_match, "text search strategy selected");

    let state = AppState {
        engine: Arc::new(SearchEngine::new(db, text_match)),
        limiter: Arc::new(RateLimiter::new(&config.rate_limit.limiter_config())),
        trust_forwarded_for: config.rate_limit.trust_forwarded_for,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        requests = config.rate_limit.requests,
        per = ?config.rate_limit.per,
        "HR search API listening"
    );

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
