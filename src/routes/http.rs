// GET/POST handlers: version, health, listings, summary, container actions

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::gateway::RuntimeGateway;

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// GET /version: package name and version baked in at build time.
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    all: Option<String>,
}

/// GET /api/containers?all=1|true. Running only unless `all` is set.
pub(super) async fn list_containers<G: RuntimeGateway>(
    State(state): State<AppState<G>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let all = matches!(query.all.as_deref(), Some("1" | "true"));
    match state.control.list_containers(all).await {
        Ok(list) => Json(list).into_response(),
        Err(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to list containers"),
    }
}

pub(super) async fn list_images<G: RuntimeGateway>(State(state): State<AppState<G>>) -> Response {
    match state.control.list_images().await {
        Ok(list) => Json(list).into_response(),
        Err(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to list images"),
    }
}

pub(super) async fn list_volumes<G: RuntimeGateway>(State(state): State<AppState<G>>) -> Response {
    match state.control.list_volumes().await {
        Ok(list) => Json(list).into_response(),
        Err(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to list volumes"),
    }
}

pub(super) async fn system_summary<G: RuntimeGateway>(
    State(state): State<AppState<G>>,
) -> Response {
    let cancel = state.shutdown.child_token();
    match state.summary.get_summary(&cancel).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "api system summary failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to get system summary")
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ActionBody {
    action: String,
}

/// POST /api/containers/{id}/action with `{"action": "start"|"stop"|...}`.
pub(super) async fn container_action<G: RuntimeGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    body: Result<Json<ActionBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return json_error(StatusCode::BAD_REQUEST, "invalid JSON body");
    };
    match state.control.execute_action(&id, &body.action).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) if e.is_client_error() => json_error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
