use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::state::AppState;

use axum::{
    extract::{Json, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

// Latest serialized world snapshot, for dashboards and smoke checks.
pub async fn latest_state_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.world.world_latest_tx.borrow().clone();
    if latest.is_empty() {
        // Nothing has been simulated yet.
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "world not ready".to_string(),
            }),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        latest.as_str().to_owned(),
    )
        .into_response()
}
