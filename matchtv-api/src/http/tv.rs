//! TV channel list, read from the persisted JSON file on every request

use std::path::Path;

use axum::{extract::State, Json};
use serde_json::Value;

use matchtv_core::Error;

use super::{AppResult, AppState};

const LOAD_FAILED: &str = "Unable to load TV channels";

/// `GET /api/tv`
pub async fn tv_channels(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(load_channels(&state.channels_path).await?))
}

/// Parse the channel list at `path`; any read or parse failure maps to one fixed message
pub async fn load_channels(path: &Path) -> Result<Value, Error> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read channel list");
        Error::LocalAsset(LOAD_FAILED.to_string())
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Channel list is not valid JSON");
        Error::LocalAsset(LOAD_FAILED.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_channels() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name":"Ch 3","url":"https://tv.example/3.m3u8"}}]"#).unwrap();

        let channels = load_channels(file.path()).await.unwrap();
        assert_eq!(channels[0]["name"], "Ch 3");
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_channels(&dir.path().join("tv.json")).await.unwrap_err();
        assert_eq!(missing, Error::LocalAsset(LOAD_FAILED.to_string()));

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        let err = load_channels(&corrupt).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to load TV channels");
    }
}
