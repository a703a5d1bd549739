// Server-rendered pages: Askama templates over the same store the API uses

mod templates;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::auth::{fetch_test_accounts, sign_in, sign_out, SessionUser};
use crate::api::validation::{validate_create_application, validate_id, validate_update_post};
use crate::db::{
    BlogPost, CreateApplicationRequest, Project, ProjectQuery, UpdatePostRequest, User,
    MAX_LIST_LIMIT,
};
use crate::AppState;

pub use templates::*;

/// Projects shown on the home page
const HOME_PROJECTS: i64 = 6;
/// Posts shown on the home page
const HOME_POSTS: i64 = 3;

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    render_with_status(StatusCode::OK, template)
}

fn render_with_status<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Template error: {}", e),
        )
            .into_response(),
    }
}

fn nav(state: &AppState, session: &SessionUser) -> Nav {
    Nav::new(&state.config.server.site_name, session.user())
}

fn message_page(
    state: &AppState,
    session: &SessionUser,
    status: StatusCode,
    title: &str,
    message: &str,
) -> Response {
    render_with_status(
        status,
        MessageTemplate {
            nav: nav(state, session),
            title: title.to_string(),
            message: message.to_string(),
        },
    )
}

fn not_found(state: &AppState, session: &SessionUser) -> Response {
    message_page(
        state,
        session,
        StatusCode::NOT_FOUND,
        "Not found",
        "The page you were looking for does not exist.",
    )
}

fn unavailable(state: &AppState, session: &SessionUser) -> Response {
    message_page(
        state,
        session,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong",
        "We could not reach the database. Please try again shortly.",
    )
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/apply", get(apply_page).post(apply_submit))
        .route("/blog/:id", get(blog_post))
        .route("/blog/edit/:id", get(edit_post_page).post(edit_post_submit))
        .route(
            "/teacher/edit-post/:id",
            get(teacher_edit_page).post(teacher_edit_submit),
        )
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
}

// Home page
async fn home(State(state): State<Arc<AppState>>, session: SessionUser) -> Response {
    let projects = state
        .store
        .list_projects(&ProjectQuery {
            status: Some("open".to_string()),
            department: None,
            limit: Some(HOME_PROJECTS),
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load projects for home page");
            Vec::new()
        });

    let posts = state
        .store
        .list_posts(true, Some(HOME_POSTS))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load posts for home page");
            Vec::new()
        });

    render_template(HomeTemplate {
        nav: nav(&state, &session),
        projects,
        posts: posts.iter().map(PostSummary::from).collect(),
    })
}

#[derive(Deserialize)]
struct ApplyQuery {
    project: Option<String>,
}

async fn open_projects(state: &AppState) -> Vec<Project> {
    state
        .store
        .list_projects(&ProjectQuery {
            status: Some("open".to_string()),
            department: None,
            limit: Some(MAX_LIST_LIMIT),
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load open projects");
            Vec::new()
        })
}

// Application form
async fn apply_page(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<ApplyQuery>,
) -> Response {
    let projects = open_projects(&state).await;
    let form = ApplyFormValues {
        project_id: query.project.unwrap_or_default(),
        name: session.user().map(|u| u.name.clone()).unwrap_or_default(),
        email: session.user().map(|u| u.email.clone()).unwrap_or_default(),
        statement: String::new(),
    };

    render_template(ApplyTemplate {
        nav: nav(&state, &session),
        projects,
        form,
        error: None,
        submitted_title: None,
    })
}

#[derive(Deserialize)]
struct ApplyForm {
    project_id: String,
    name: String,
    email: String,
    statement: String,
}

// Submit application
async fn apply_submit(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Form(form): Form<ApplyForm>,
) -> Response {
    let req = CreateApplicationRequest {
        project_id: form.project_id,
        name: form.name,
        email: form.email,
        statement: form.statement,
    };

    let rejected = |status: StatusCode,
                    error: String,
                    req: CreateApplicationRequest,
                    projects: Vec<Project>| {
        render_with_status(
            status,
            ApplyTemplate {
                nav: nav(&state, &session),
                projects,
                form: ApplyFormValues {
                    project_id: req.project_id,
                    name: req.name,
                    email: req.email,
                    statement: req.statement,
                },
                error: Some(error),
                submitted_title: None,
            },
        )
    };

    if let Err(e) = validate_create_application(&req) {
        let projects = open_projects(&state).await;
        return rejected(StatusCode::BAD_REQUEST, e.message().to_string(), req, projects);
    }

    let lookup = state.store.get_project(&req.project_id).await;
    let project = match lookup {
        Ok(Some(project)) if project.is_open() => project,
        Ok(_) => {
            let projects = open_projects(&state).await;
            return rejected(
                StatusCode::BAD_REQUEST,
                "That project is not accepting applications".to_string(),
                req,
                projects,
            );
        }
        Err(e) => {
            warn!(error = %e, "Failed to look up project for application");
            return unavailable(&state, &session);
        }
    };

    match state.store.create_application(&req).await {
        Ok(application) => {
            info!(
                application_id = %application.id,
                project_id = %project.id,
                "Application submitted"
            );
            render_template(ApplyTemplate {
                nav: nav(&state, &session),
                projects: Vec::new(),
                form: ApplyFormValues::default(),
                error: None,
                submitted_title: Some(project.title),
            })
        }
        Err(e) => {
            warn!(error = %e, "Failed to store application");
            unavailable(&state, &session)
        }
    }
}

/// Whether `user` may edit `post` from the author editor
fn can_edit(user: &User, post: &BlogPost) -> bool {
    user.role().can_moderate() || post.author_id.as_deref() == Some(user.id.as_str())
}

async fn load_post(
    state: &AppState,
    session: &SessionUser,
    id: &str,
) -> Result<BlogPost, Response> {
    if validate_id(id, "post_id").is_err() {
        return Err(not_found(state, session));
    }

    match state.store.get_post(id).await {
        Ok(Some(post)) => Ok(post),
        Ok(None) => Err(not_found(state, session)),
        Err(e) => {
            warn!(error = %e, post_id = %id, "Failed to load post");
            Err(unavailable(state, session))
        }
    }
}

// Blog post
async fn blog_post(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Response {
    let post = match load_post(&state, &session, &id).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    let editable = session.user().map(|u| can_edit(u, &post)).unwrap_or(false);

    // Drafts are only visible to people who can edit them
    if !post.published && !editable {
        return not_found(&state, &session);
    }

    let edit_url = if session.can_moderate() {
        Some(format!("/teacher/edit-post/{}", post.id))
    } else if editable {
        Some(format!("/blog/edit/{}", post.id))
    } else {
        None
    };

    render_template(PostTemplate {
        nav: nav(&state, &session),
        post,
        edit_url,
    })
}

#[derive(Deserialize)]
struct EditPostForm {
    title: String,
    content: String,
    published: Option<String>,
}

fn edit_page(
    state: &AppState,
    session: &SessionUser,
    post: BlogPost,
    teacher_mode: bool,
    error: Option<String>,
) -> Response {
    let action = if teacher_mode {
        format!("/teacher/edit-post/{}", post.id)
    } else {
        format!("/blog/edit/{}", post.id)
    };
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };

    render_with_status(
        status,
        EditPostTemplate {
            nav: nav(state, session),
            post,
            action,
            teacher_mode,
            error,
        },
    )
}

async fn save_post(
    state: &AppState,
    session: &SessionUser,
    mut post: BlogPost,
    form: EditPostForm,
    teacher_mode: bool,
) -> Response {
    let req = UpdatePostRequest {
        title: Some(form.title),
        content: Some(form.content),
        published: teacher_mode.then_some(form.published.is_some()),
    };

    if let Err(e) = validate_update_post(&req) {
        // Echo the rejected input back into the editor
        post.title = req.title.unwrap_or(post.title);
        post.content = req.content.unwrap_or(post.content);
        return edit_page(state, session, post, teacher_mode, Some(e.message().to_string()));
    }

    match state.store.update_post(&post.id, &req).await {
        Ok(Some(saved)) => {
            info!(post_id = %saved.id, teacher_mode, "Post saved from editor");
            Redirect::to(&format!("/blog/{}", saved.id)).into_response()
        }
        Ok(None) => not_found(state, session),
        Err(e) => {
            warn!(error = %e, post_id = %post.id, "Failed to save post");
            unavailable(state, session)
        }
    }
}

// Author editor
async fn edit_post_page(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = session.user() else {
        return Redirect::to("/login").into_response();
    };

    let post = match load_post(&state, &session, &id).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    if !can_edit(user, &post) {
        return message_page(
            &state,
            &session,
            StatusCode::FORBIDDEN,
            "Not allowed",
            "You can only edit your own posts.",
        );
    }

    edit_page(&state, &session, post, false, None)
}

async fn edit_post_submit(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(id): Path<String>,
    Form(form): Form<EditPostForm>,
) -> Response {
    let Some(user) = session.user() else {
        return Redirect::to("/login").into_response();
    };

    let post = match load_post(&state, &session, &id).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    if !can_edit(user, &post) {
        return message_page(
            &state,
            &session,
            StatusCode::FORBIDDEN,
            "Not allowed",
            "You can only edit your own posts.",
        );
    }

    save_post(&state, &session, post, form, false).await
}

// Teacher editor
async fn teacher_edit_page(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Response {
    if !session.can_moderate() {
        return Redirect::to("/login").into_response();
    }

    match load_post(&state, &session, &id).await {
        Ok(post) => edit_page(&state, &session, post, true, None),
        Err(response) => response,
    }
}

async fn teacher_edit_submit(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(id): Path<String>,
    Form(form): Form<EditPostForm>,
) -> Response {
    if !session.can_moderate() {
        return Redirect::to("/login").into_response();
    }

    match load_post(&state, &session, &id).await {
        Ok(post) => save_post(&state, &session, post, form, true).await,
        Err(response) => response,
    }
}

// Login page
async fn login_page(State(state): State<Arc<AppState>>, session: SessionUser) -> Response {
    let (accounts, error) = match fetch_test_accounts(&state).await {
        Ok(accounts) => (accounts, None),
        Err(e) => {
            warn!(error = %e, "Failed to load test accounts");
            (Vec::new(), Some("Could not load test accounts.".to_string()))
        }
    };

    render_template(LoginTemplate {
        nav: nav(&state, &session),
        accounts,
        error,
    })
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
}

// Login submit
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match sign_in(&state, jar, &form.email).await {
        Ok(Some((jar, _user))) => (jar, Redirect::to("/")).into_response(),
        Ok(None) => {
            let accounts = fetch_test_accounts(&state).await.unwrap_or_default();
            render_with_status(
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    nav: Nav::new(&state.config.server.site_name, None),
                    accounts,
                    error: Some("That account is not a test account.".to_string()),
                },
            )
        }
        Err(e) => {
            warn!(error = %e, "Failed to sign in");
            unavailable(&state, &SessionUser(None))
        }
    }
}

// Logout
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    (sign_out(&state, jar), Redirect::to("/"))
}
