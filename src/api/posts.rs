//! Blog post API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::{BlogPost, CreatePostRequest, UpdatePostRequest};
use crate::AppState;

use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery};
use super::validation::{require_id, validate_create_post, validate_update_post};

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /api/posts?published=true&limit=10
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let posts = state
        .store
        .list_posts(query.published.unwrap_or(false), query.limit)
        .await?;
    Ok(Json(posts))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    require_id(&id, "post_id")?;

    let post = state
        .store
        .get_post(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(post))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    validate_create_post(&req)?;

    if let Some(ref author_id) = req.author_id {
        require_id(author_id, "author_id")?;
    }

    let post = state.store.create_post(&req).await?;
    info!(post_id = %post.id, published = post.published, "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/:id
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdatePostRequest>,
) -> Result<Json<BlogPost>, ApiError> {
    require_id(&id, "post_id")?;
    validate_update_post(&req)?;

    let post = state
        .store
        .update_post(&id, &req)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    info!(post_id = %id, "Post updated");
    Ok(Json(post))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "post_id")?;

    if !state.store.delete_post(&id).await? {
        return Err(ApiError::not_found("Post not found"));
    }

    info!(post_id = %id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}
