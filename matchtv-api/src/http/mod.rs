// HTTP/JSON API
//
// Schedule listings (cached), the two stream relays, the TV channel list and
// a health check.

pub mod error;
pub mod health;
pub mod schedule;
pub mod stream;
pub mod tv;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use matchtv_core::cache::ScrapeCache;
use matchtv_core::provider::ScheduleSource;
use matchtv_proxy::StreamRelay;

pub use error::{AppError, AppResult};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: ScrapeCache,
    pub football_source: Arc<dyn ScheduleSource>,
    pub volleyball_source: Arc<dyn ScheduleSource>,
    pub football_relay: Arc<StreamRelay>,
    pub tv_relay: Arc<StreamRelay>,
    pub channels_path: PathBuf,
}

/// Create the HTTP router.
///
/// Non-API paths fall through to `static_dir` when it exists.
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    // Stream routes answer their own preflights, so CORS here covers the JSON routes only
    let api = Router::new()
        .merge(health::create_health_router())
        .route("/api/football", get(schedule::football_matches))
        .route("/api/live/volleyball", get(schedule::volleyball_matches))
        .route("/api/tv", get(tv::tv_channels))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let mut router = api.merge(stream::create_stream_router());

    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            router = router.fallback_service(
                tower_http::services::ServeDir::new(dir).append_index_html_on_directories(true),
            );
        } else {
            tracing::debug!("Static directory {:?} not found, skipping", dir);
        }
    }

    router
        .layer(TraceLayer::new_for_http())
        // Apply state to all routes (must be last)
        .with_state(state)
}
