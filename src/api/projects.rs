//! Research projects API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::db::{
    Application, CreateProjectRequest, Project, ProjectQuery, UpdateProjectRequest,
};
use crate::AppState;

use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery};
use super::validation::{
    require_id, validate_create_project, validate_status, validate_update_project,
};

/// List projects, newest first
///
/// GET /api/projects?status=open&department=Physics&limit=20
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    if let Err(e) = validate_status(&query.status) {
        return Err(ApiError::validation_field("status", e));
    }

    let projects = state.store.list_projects(&query).await?;
    Ok(Json(projects))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    require_id(&id, "project_id")?;

    let project = state
        .store
        .get_project(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(project))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    validate_create_project(&req)?;

    if let Some(ref supervisor_id) = req.supervisor_id {
        require_id(supervisor_id, "supervisor_id")?;
        if state.store.get_user(supervisor_id).await?.is_none() {
            return Err(ApiError::validation_field(
                "supervisor_id",
                "Supervisor does not exist",
            ));
        }
    }

    let project = state.store.create_project(&req).await?;
    info!(project_id = %project.id, title = %project.title, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    require_id(&id, "project_id")?;
    validate_update_project(&req)?;

    let project = state
        .store
        .update_project(&id, &req)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    info!(project_id = %id, "Project updated");
    Ok(Json(project))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "project_id")?;

    if !state.store.delete_project(&id).await? {
        return Err(ApiError::not_found("Project not found"));
    }

    info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Applications submitted for a project
///
/// GET /api/projects/:id/applications
pub async fn list_applications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Application>>, ApiError> {
    require_id(&id, "project_id")?;

    if state.store.get_project(&id).await?.is_none() {
        return Err(ApiError::not_found("Project not found"));
    }

    let applications = state.store.list_applications(&id).await?;
    Ok(Json(applications))
}
