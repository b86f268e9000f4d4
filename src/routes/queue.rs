use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::intake::QueueSnapshot;

/// GET /api/v1/queue: current processing state and pending files.
pub async fn queue_status(
    State(state): State<AppState>,
) -> Result<Json<QueueSnapshot>, StatusCode> {
    state
        .sequencer
        .snapshot()
        .await
        .map(Json)
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}
