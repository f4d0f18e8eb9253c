//! Search Activity Insights Backend
//!
//! A REST backend that imports Google Takeout "My Activity" exports into
//! SQLite and serves datasets, classification, and CSV export to the
//! dashboard frontend.

mod api;
mod classify;
mod config;
mod db;
mod errors;
mod export;
mod models;
mod parser;
mod state;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use classify::Classifier;
use config::Config;
use db::Repository;
use state::ActiveDataset;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub classifier: Arc<Classifier>,
    pub active: Arc<ActiveDataset>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Search Activity Insights Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Classifier endpoint: {}", config.classifier_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database (recreates a corrupted or incompatible store)
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let classifier = Arc::new(Classifier::new(config.classifier_url.clone()));

    // Create application state
    let state = AppState {
        repo,
        classifier,
        active: Arc::new(ActiveDataset::new()),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Import & dataset selection
        .route("/import", post(api::import_activity))
        .route("/dataset", get(api::get_dataset))
        .route("/dataset/select", post(api::select_dataset))
        .route("/dataset/summary", get(api::dataset_summary))
        // Records
        .route("/dataset/records", get(api::list_records))
        .route(
            "/dataset/records/{id}/category",
            put(api::update_record_category),
        )
        // Classification
        .route("/classify", post(api::classify_preview))
        .route("/classify/apply", post(api::classify_apply))
        // Export
        .route("/export/csv", get(api::export_csv))
        // Snapshots & samples
        .route(
            "/snapshots",
            get(api::list_snapshots).post(api::save_snapshot),
        )
        .route("/snapshots/{id}", delete(api::delete_snapshot))
        .route("/samples", get(api::list_samples))
        // Catalog
        .route("/categories", get(api::list_categories));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
