use std::sync::Arc;

use axum::{Router, routing::get};

use cache::CacheStore;
use config::Config;
use middleware::{RateLimiter, rate_limit};

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: Arc<dyn CacheStore>,
}

/// Builds the application router. Kept separate from `main` so tests can
/// drive the full request path without binding a socket.
pub fn app(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    // Rate limiting is scoped to /data only
    let data_routes = Router::new()
        .route("/data", get(routes::data::get_data))
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .merge(data_routes)
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}
