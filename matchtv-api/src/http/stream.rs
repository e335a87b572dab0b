//! Stream relay routes
//!
//! `GET /api/football/stream?url=...` and `GET /api/tv/stream?url=...`,
//! each with an `OPTIONS` preflight.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, RANGE},
        HeaderMap, HeaderValue,
    },
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::set_header::SetResponseHeaderLayer;

use matchtv_proxy::{proxy_options_preflight, StreamRelay, FOOTBALL_STREAM_PATH, TV_STREAM_PATH};

use super::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub url: Option<String>,
}

pub fn create_stream_router() -> Router<AppState> {
    Router::new()
        .route(
            FOOTBALL_STREAM_PATH,
            get(football_stream).options(proxy_options_preflight),
        )
        .route(TV_STREAM_PATH, get(tv_stream).options(proxy_options_preflight))
        // Error bodies must be readable cross-origin too
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

pub async fn football_stream(
    State(state): State<AppState>,
    query: Result<Query<StreamQuery>, QueryRejection>,
    headers: HeaderMap,
) -> AppResult<Response> {
    relay(&state.football_relay, query, &headers).await
}

pub async fn tv_stream(
    State(state): State<AppState>,
    query: Result<Query<StreamQuery>, QueryRejection>,
    headers: HeaderMap,
) -> AppResult<Response> {
    relay(&state.tv_relay, query, &headers).await
}

async fn relay(
    relay: &StreamRelay,
    query: Result<Query<StreamQuery>, QueryRejection>,
    headers: &HeaderMap,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;

    tracing::debug!(
        relay = relay.proxy_path(),
        target = query.url.as_deref().unwrap_or_default(),
        "Relaying stream"
    );

    Ok(relay.relay(query.url.as_deref(), headers.get(RANGE)).await?)
}
