use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use atrium_api::handlers::{self, AppState};
use atrium_api::middleware::jwt_auth_middleware;
use atrium_api::resources;
use atrium_api::services::{SearchService, WaitlistService};
use atrium_api::storage::{MemoryGateway, PgGateway, StorageGateway};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = atrium_api::config::config();
    tracing::info!("Starting Atrium API in {:?} mode", config.environment);

    let gateway = build_gateway(config);
    let search = SearchService::new(resources::registry(), gateway);
    let waitlist = Arc::new(WaitlistService::new(search.clone()));
    let state = AppState { search, waitlist };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("ATRIUM_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Atrium API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

/// Postgres when DATABASE_URL is set, the in-memory gateway otherwise
/// (demo/test deployments).
fn build_gateway(config: &atrium_api::config::AppConfig) -> Arc<dyn StorageGateway> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
                .connect_lazy(&url)
                .unwrap_or_else(|e| panic!("invalid DATABASE_URL: {}", e));
            Arc::new(PgGateway::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using the in-memory storage gateway");
            Arc::new(MemoryGateway::new())
        }
    }
}

fn app(state: AppState) -> Router {
    let config = atrium_api::config::config();
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected search API
        .merge(api_routes(state))
        // Global middleware
        .layer(axum::extract::DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/appointments", get(handlers::appointments::list))
        .route("/api/appointments/:id", get(handlers::appointments::get))
        .route("/api/ingredient-prices", get(handlers::prices::list))
        .route("/api/waitlist", get(handlers::waitlist::list).post(handlers::waitlist::join))
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware))
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Atrium API",
            "version": version,
            "description": "Multi-tenant backend API with a shared scoped search engine",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "appointments": "/api/appointments[/:id] (protected)",
                "ingredient_prices": "/api/ingredient-prices (protected)",
                "waitlist": "/api/waitlist (protected)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
