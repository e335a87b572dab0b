//! Cached schedule listings
//!
//! Both endpoints read through the scrape cache; the adapter only runs when
//! the source's slot is empty or older than the TTL.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use matchtv_core::provider::{ScheduleSource, SourceKind};

use super::{AppResult, AppState};

/// `GET /api/football`: `{success, data, count}`
pub async fn football_matches(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let source: Arc<dyn ScheduleSource> = Arc::clone(&state.football_source);

    let cached = state
        .cache
        .get_or_refresh(SourceKind::Football, move || async move {
            let data = source.fetch().await?;
            Ok(json!({
                "success": true,
                "count": data.len(),
                "data": data,
            }))
        })
        .await?;

    Ok(Json(cached.payload))
}

/// `GET /api/live/volleyball`: the bare array of `{match, src}`
pub async fn volleyball_matches(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let source: Arc<dyn ScheduleSource> = Arc::clone(&state.volleyball_source);

    let cached = state
        .cache
        .get_or_refresh(SourceKind::Volleyball, move || async move {
            Ok(Value::Array(source.fetch().await?))
        })
        .await?;

    Ok(Json(cached.payload))
}
