//! Project handlers

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::models::CreateProjectRequest;
use super::validators::ProjectValidator;
use crate::auth::SessionUser;
use crate::common::{ApiError, AppState, Validator};
use crate::store::projects::{create_project, delete_project, get_project, list_projects};

/// GET /api/projects
/// Lists the caller's projects, newest first.
pub async fn list(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let projects = list_projects(&state.db, &authed.user_id)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(serde_json::json!({ "projects": projects })))
}

/// POST /api/projects
///
/// # Request Body
/// ```json
/// { "title": "Spring drop", "description": "Teaser reel", "coverUrl": "/u/cover.png" }
/// ```
pub async fn create(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = ProjectValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let project = create_project(&state.db, &authed.user_id, &payload)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %authed.user_id, project_id = %project.id, "Project created");

    Ok(Json(serde_json::json!({ "project": project })))
}

/// GET /api/projects/:id
pub async fn get_one(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
    Path(project_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let project = get_project(&state.db, &authed.user_id, &project_id)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(serde_json::json!({ "project": project })))
}

/// DELETE /api/projects/:id
pub async fn delete(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
    Path(project_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let deleted = delete_project(&state.db, &authed.user_id, &project_id)
        .await
        .map_err(ApiError::DatabaseError)?;
    if !deleted {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    info!(user_id = %authed.user_id, project_id = %project_id, "Project deleted");

    Ok(Json(serde_json::json!({ "ok": true })))
}
