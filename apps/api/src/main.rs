use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use socialgraph_api::config::{Config, StoreBackend};
use socialgraph_api::routes::{app_router, AppState};
use socialgraph_api::{MemoryStore, PgStore, Store};

/// CORS policy from `CORS_ORIGINS`
///
/// Listed origins are allowed in every environment. Without a list,
/// production rejects cross-origin requests and development allows any.
fn build_cors_layer(config: &Config) -> CorsLayer {
    let origins = config.cors_allowed_origins.as_deref().unwrap_or_default();

    if origins.is_empty() {
        if config.environment().is_production() {
            tracing::warn!("CORS_ORIGINS not set; cross-origin requests will be rejected");
            return CorsLayer::new();
        }
        tracing::warn!("CORS_ORIGINS not set; allowing any origin outside production");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::error!("No valid CORS origins configured; cross-origin requests will be rejected");
        return CorsLayer::new();
    }

    tracing::info!(origins = ?origins, "CORS restricted to {} origin(s)", allowed.len());
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Open the configured store, running migrations for postgres
async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let database = config.database();
            tracing::info!(url = %database.redacted_url(), "Connecting to database...");

            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .min_connections(database.min_connections)
                .acquire_timeout(database.connect_timeout)
                .idle_timeout(database.idle_timeout)
                .connect(&database.url)
                .await?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations completed successfully");

            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.common.log_filter("socialgraph_api").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        port = config.port,
        environment = %config.environment(),
        store = %config.store_backend,
        max_query_depth = config.max_query_depth,
        "Starting social graph API server"
    );

    let store = connect_store(&config).await?;
    let state = AppState::new(store, config.max_query_depth, config.graphql_playground);

    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    if config.graphql_playground {
        tracing::info!(
            "GraphQL Playground available at http://{}:{}/graphql/playground",
            addr.ip(),
            addr.port()
        );
    }

    axum::serve(listener, app).await?;

    Ok(())
}
