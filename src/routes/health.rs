use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::quota;
use crate::state::AppState;

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let dir = state.config.listings_dir();
    let stats = match quota::directory_stats(&dir).await {
        Ok(stats) => stats,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => quota::DirStats::default(),
        Err(e) => return Err(e.into()),
    };
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds();

    Ok(Json(json!({
        "data": {
            "stored_images": stats.files,
            "total_size_bytes": stats.bytes,
            "quota_ceiling_bytes": state.config.quota_ceiling_bytes,
            "uptime_seconds": uptime,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "error": null
    })))
}
