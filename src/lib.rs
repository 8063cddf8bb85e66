pub mod adaptive;
pub mod config;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adaptive::catalog::InMemoryCatalog;
use crate::adaptive::{AdaptiveConfig, AdaptiveEngine, AdaptiveResult};
use crate::config::Config;
use crate::state::AppState;

/// Builds the service state, loading the catalog from `config.catalog_path` when set.
pub fn build_state(config: Config, engine_config: AdaptiveConfig) -> AdaptiveResult<AppState> {
    let engine = AdaptiveEngine::new(engine_config)?;
    let catalog = match config.catalog_path.as_deref() {
        Some(path) => InMemoryCatalog::from_file(path)?,
        None => InMemoryCatalog::default(),
    };
    tracing::info!(catalog_items = catalog.len(), "adaptive engine ready");
    Ok(AppState::new(config, engine, catalog))
}

pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
