//! The query surface shared by the hosted and local backends.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::{
    Application, BlogPost, CreateApplicationRequest, CreatePostRequest, CreateProjectRequest,
    CreateUserRequest, Project, ProjectQuery, UpdatePostRequest, UpdateProjectRequest, User,
};

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: i64 = 50;
/// Hard cap on any listing
pub const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to database failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("unexpected response from database: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One method per query the portal issues. Implementations hold their own
/// connection pooling and are shared behind `Arc<dyn Store>`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short name of the backend for logs
    fn backend(&self) -> &'static str;

    // Users
    async fn recent_users(&self, limit: i64) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<i64>;
    async fn users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, req: &CreateUserRequest) -> StoreResult<User>;

    // Projects
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<Project>>;
    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>>;
    async fn create_project(&self, req: &CreateProjectRequest) -> StoreResult<Project>;
    async fn update_project(
        &self,
        id: &str,
        req: &UpdateProjectRequest,
    ) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: &str) -> StoreResult<bool>;
    /// First row of `projects` as raw column/value pairs
    async fn sample_project(&self) -> StoreResult<Option<Map<String, Value>>>;

    // Blog posts
    async fn list_posts(&self, published_only: bool, limit: Option<i64>)
        -> StoreResult<Vec<BlogPost>>;
    async fn get_post(&self, id: &str) -> StoreResult<Option<BlogPost>>;
    async fn create_post(&self, req: &CreatePostRequest) -> StoreResult<BlogPost>;
    async fn update_post(&self, id: &str, req: &UpdatePostRequest)
        -> StoreResult<Option<BlogPost>>;
    async fn delete_post(&self, id: &str) -> StoreResult<bool>;

    // Applications
    async fn create_application(&self, req: &CreateApplicationRequest)
        -> StoreResult<Application>;
    async fn list_applications(&self, project_id: &str) -> StoreResult<Vec<Application>>;
}

/// Clamp a requested listing size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}
