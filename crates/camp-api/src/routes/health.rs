use axum::Json;
use axum::extract::State;

use crate::error::ApiError;
use crate::models::USERS;
use crate::state::AppState;

/// Liveness plus a store round trip; a closed store reports 500.
pub async fn healthz(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .blocking(|store| Ok(store.count(USERS, None)?))
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
