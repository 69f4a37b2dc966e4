use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use crate::model::HealthResponse;
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.pastebin().stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                pastes: Some(stats),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check could not reach storage");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    pastes: None,
                }),
            )
        }
    }
}
