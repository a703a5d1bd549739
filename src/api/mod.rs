pub mod auth;
mod debug;
pub mod error;
mod extract;
mod posts;
mod projects;
mod users;
pub mod validation;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::AppState;

pub use users::RECENT_USERS_LIMIT;

/// JSON API routes; page routes are merged in by `create_app`.
pub fn create_router() -> Router<Arc<AppState>> {
    let api_routes = Router::new()
        // Users
        .route("/users", get(users::users_overview).post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/test-login", get(auth::test_login))
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/projects/:id/applications", get(projects::list_applications))
        // Blog
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        // Diagnostics
        .route("/debug/table-schema", get(debug::table_schema));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
}

/// Full application: API and pages behind tracing and gzip.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_router())
        .merge(crate::ui::create_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
