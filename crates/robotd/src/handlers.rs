//! HTTP handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::RobotState;

fn not_initialized() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "detail": "Robot not initialized" })),
    )
        .into_response()
}

/// GET /health
pub async fn health(State(state): State<RobotState>) -> Response {
    let Some(robot) = state.robot.as_deref() else {
        return not_initialized();
    };
    Json(json!({
        "status": "healthy",
        "robot_id": robot.robot_id,
        "version": state.version,
    }))
    .into_response()
}

/// GET /status
pub async fn status(State(state): State<RobotState>) -> Response {
    let Some(robot) = state.robot.as_deref() else {
        return not_initialized();
    };
    Json(json!({
        "robot_id": robot.robot_id,
        "sensors": robot.sensors,
        "initialized": true,
        "version": state.version,
    }))
    .into_response()
}

/// GET /
pub async fn root(State(state): State<RobotState>) -> impl IntoResponse {
    let (robot_id, status) = match state.robot.as_deref() {
        Some(robot) => (robot.robot_id.as_str(), "running"),
        None => ("unknown", "initializing"),
    };
    Json(json!({
        "message": "Robot Fleet Management System",
        "robot_id": robot_id,
        "status": status,
    }))
}
