pub mod health;
pub mod reprice;

use crate::config::Config;
use crate::engine::Repricer;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repricer: Repricer,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            repricer: Repricer::new(config.engine_settings()),
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/reprice", post(reprice::reprice))
        .layer(cors)
        .with_state(state)
}
