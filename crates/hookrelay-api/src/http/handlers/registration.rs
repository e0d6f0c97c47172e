//! Registration admin endpoints.
//!
//! Changes made here go through the same lookup cache as the receiver, so
//! they take effect for the running server immediately.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use hookrelay_types::event::EventRegistration;
use hookrelay_types::workflow::WorkflowId;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterTriggerRequest {
    pub path: String,
    pub workflow_id: String,
    pub node: String,
}

#[derive(Debug, Serialize)]
pub struct DeregisteredPaths {
    pub workflow_id: String,
    pub paths: Vec<String>,
}

fn request_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// GET /api/v1/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<EventRegistration>>>, AppError> {
    let start = Instant::now();
    let registrations = state.registry.list().await?;

    let resp = ApiResponse::success(registrations, request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", "/api/v1/registrations");
    Ok(Json(resp))
}

/// GET /api/v1/registrations/{*path}
pub async fn get_registration(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<ApiResponse<EventRegistration>>, AppError> {
    let start = Instant::now();
    let registration = state
        .registry
        .find(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No registration for path '{path}'")))?;

    let self_link = format!("/api/v1/registrations/{}", registration.path);
    let resp = ApiResponse::success(registration, request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", &self_link);
    Ok(Json(resp))
}

/// POST /api/v1/registrations - Bind a trigger node to a path.
pub async fn register_trigger(
    State(state): State<AppState>,
    Json(body): Json<RegisterTriggerRequest>,
) -> Result<Json<ApiResponse<EventRegistration>>, AppError> {
    let start = Instant::now();
    if body.path.trim_matches('/').is_empty() {
        return Err(AppError::Validation("path must not be empty".to_string()));
    }
    if body.workflow_id.is_empty() || body.node.is_empty() {
        return Err(AppError::Validation(
            "workflow_id and node are required".to_string(),
        ));
    }

    let registration = state
        .registry
        .register_trigger(&body.path, &WorkflowId::new(body.workflow_id), &body.node)
        .await?;

    let self_link = format!("/api/v1/registrations/{}", registration.path);
    let resp = ApiResponse::success(registration, request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", &self_link);
    Ok(Json(resp))
}

/// DELETE /api/v1/workflows/{id}/registrations - Unbind every trigger of a workflow.
pub async fn deregister_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<ApiResponse<DeregisteredPaths>>, AppError> {
    let start = Instant::now();
    let paths = state
        .registry
        .deregister_workflow(&WorkflowId::new(workflow_id.clone()))
        .await?;

    let resp = ApiResponse::success(
        DeregisteredPaths { workflow_id, paths },
        request_id(),
        start.elapsed().as_millis() as u64,
    );
    Ok(Json(resp))
}
