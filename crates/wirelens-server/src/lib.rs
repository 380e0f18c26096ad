#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use wirelens_contracts::RelayConfig;
use wirelens_engine::{GalleryCache, InferenceGateway};

mod handlers;

pub use handlers::{ClearCacheRequest, DescriptionRequest};

/// Shared state for the relay endpoints. The gallery cache is the
/// only mutable piece; everything else is read-only configuration and
/// clients.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<GalleryCache>,
    pub gateway: Arc<dyn InferenceGateway>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(
        cache: Arc<GalleryCache>,
        gateway: Arc<dyn InferenceGateway>,
        config: Arc<RelayConfig>,
    ) -> Self {
        Self {
            cache,
            gateway,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz_handler))
        .route("/analyze", post(handlers::analyze_handler))
        .route("/clear-cache", post(handlers::clear_cache_handler))
        .route(
            "/generate-description",
            post(handlers::generate_description_handler),
        )
        .with_state(state)
}
