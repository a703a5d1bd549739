//! Hosted database client.
//!
//! Talks to the PostgREST endpoint exposed by the hosted database
//! (`{url}/rest/v1/{table}`), authenticating every request with the
//! service-role key as both `apikey` and bearer token.

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::models::{
    timestamp, Application, BlogPost, CreateApplicationRequest, CreatePostRequest,
    CreateProjectRequest, CreateUserRequest, Project, ProjectQuery, UpdatePostRequest,
    UpdateProjectRequest, User,
};
use super::store::{clamp_limit, Store, StoreError, StoreResult, DEFAULT_LIST_LIMIT};

const USERS: &str = "users";
const PROJECTS: &str = "projects";
const BLOG_POSTS: &str = "blog_posts";
const APPLICATIONS: &str = "applications";

const NEWEST_FIRST: &str = "created_at.desc";

pub struct PostgrestStore {
    rest_url: String,
    service_role_key: String,
    client: reqwest::Client,
}

/// Error body PostgREST returns on non-2xx responses
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl PostgrestStore {
    pub fn new(url: &str, service_role_key: &str, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("research-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            service_role_key: service_role_key.to_string(),
            client,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.service_role_key)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.service_role_key),
            )
    }

    /// Send a request and decode a JSON body.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> StoreResult<T> {
        let response = check_status(builder.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        debug!(table, ?params, "PostgREST select");
        let builder = self
            .request(Method::GET, table)
            .query(&[("select", "*")])
            .query(params);
        self.fetch(builder).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self
            .select(
                table,
                &[(column, eq(value)), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> StoreResult<T> {
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row);
        let rows: Vec<T> = self.fetch(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("insert into {} returned no rows", table)))
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        changes: &B,
    ) -> StoreResult<Option<T>> {
        let mut body =
            serde_json::to_value(changes).map_err(|e| StoreError::Decode(e.to_string()))?;
        if let Value::Object(ref mut fields) = body {
            fields.insert("updated_at".to_string(), Value::String(timestamp()));
        }

        let builder = self
            .request(Method::PATCH, table)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<T> = self.fetch(builder).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<bool> {
        let builder = self
            .request(Method::DELETE, table)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation");
        let rows: Vec<Value> = self.fetch(builder).await?;
        Ok(!rows.is_empty())
    }
}

async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

/// Turn a PostgREST error body into a `StoreError::Api`.
pub fn api_error(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(parsed) => {
            let mut message = parsed
                .message
                .unwrap_or_else(|| format!("HTTP {}", status));
            if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
                message = format!("{} ({})", message, details);
            }
            if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
                message = format!("{}. Hint: {}", message, hint);
            }
            StoreError::Api {
                status,
                message,
                code: parsed.code,
            }
        }
        Err(_) => StoreError::Api {
            status,
            message: if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                body.to_string()
            },
            code: None,
        },
    }
}

/// `eq.<value>` filter
fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// `in.("a","b")` filter with each value quoted
pub fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<i64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl Store for PostgrestStore {
    fn backend(&self) -> &'static str {
        "postgrest"
    }

    async fn recent_users(&self, limit: i64) -> StoreResult<Vec<User>> {
        self.select(
            USERS,
            &[
                ("order", NEWEST_FIRST.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let response = self
            .request(Method::HEAD, USERS)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check_status(response).await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                StoreError::Decode("missing or invalid Content-Range header".to_string())
            })
    }

    async fn users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        self.select(USERS, &[("email", in_filter(emails))]).await
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.select_one(USERS, "id", id).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.select_one(USERS, "email", &email.trim().to_lowercase())
            .await
    }

    async fn create_user(&self, req: &CreateUserRequest) -> StoreResult<User> {
        self.insert(USERS, &User::from_request(req)).await
    }

    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<Project>> {
        let mut params = vec![
            ("order", NEWEST_FIRST.to_string()),
            (
                "limit",
                clamp_limit(query.limit, DEFAULT_LIST_LIMIT).to_string(),
            ),
        ];
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(("status", eq(status)));
        }
        if let Some(department) = query.department.as_deref().filter(|d| !d.is_empty()) {
            params.push(("department", eq(department)));
        }
        self.select(PROJECTS, &params).await
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        self.select_one(PROJECTS, "id", id).await
    }

    async fn create_project(&self, req: &CreateProjectRequest) -> StoreResult<Project> {
        self.insert(PROJECTS, &Project::from_request(req)).await
    }

    async fn update_project(
        &self,
        id: &str,
        req: &UpdateProjectRequest,
    ) -> StoreResult<Option<Project>> {
        self.patch(PROJECTS, id, req).await
    }

    async fn delete_project(&self, id: &str) -> StoreResult<bool> {
        self.delete(PROJECTS, id).await
    }

    async fn sample_project(&self) -> StoreResult<Option<Map<String, Value>>> {
        let rows: Vec<Map<String, Value>> = self
            .select(PROJECTS, &[("limit", "1".to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_posts(
        &self,
        published_only: bool,
        limit: Option<i64>,
    ) -> StoreResult<Vec<BlogPost>> {
        let mut params = vec![
            ("order", NEWEST_FIRST.to_string()),
            ("limit", clamp_limit(limit, DEFAULT_LIST_LIMIT).to_string()),
        ];
        if published_only {
            params.push(("published", "eq.true".to_string()));
        }
        self.select(BLOG_POSTS, &params).await
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<BlogPost>> {
        self.select_one(BLOG_POSTS, "id", id).await
    }

    async fn create_post(&self, req: &CreatePostRequest) -> StoreResult<BlogPost> {
        self.insert(BLOG_POSTS, &BlogPost::from_request(req)).await
    }

    async fn update_post(
        &self,
        id: &str,
        req: &UpdatePostRequest,
    ) -> StoreResult<Option<BlogPost>> {
        self.patch(BLOG_POSTS, id, req).await
    }

    async fn delete_post(&self, id: &str) -> StoreResult<bool> {
        self.delete(BLOG_POSTS, id).await
    }

    async fn create_application(
        &self,
        req: &CreateApplicationRequest,
    ) -> StoreResult<Application> {
        self.insert(APPLICATIONS, &Application::from_request(req))
            .await
    }

    async fn list_applications(&self, project_id: &str) -> StoreResult<Vec<Application>> {
        self.select(
            APPLICATIONS,
            &[
                ("project_id", eq(project_id)),
                ("order", NEWEST_FIRST.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_in_filter_quotes_values() {
        let emails = vec!["a@test.edu".to_string(), "b@test.edu".to_string()];
        assert_eq!(in_filter(&emails), r#"in.("a@test.edu","b@test.edu")"#);

        let tricky = vec![r#"x"y@test.edu"#.to_string()];
        assert_eq!(in_filter(&tricky), r#"in.("x\"y@test.edu")"#);
    }

    #[test]
    fn test_api_error_from_postgrest_body() {
        let err = api_error(
            400,
            r#"{"code":"42703","details":null,"hint":null,
                "message":"column users.nope does not exist"}"#,
        );
        match err {
            StoreError::Api {
                status,
                message,
                code,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "column users.nope does not exist");
                assert_eq!(code.as_deref(), Some("42703"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_with_plain_body() {
        match api_error(502, "") {
            StoreError::Api { message, code, .. } => {
                assert_eq!(message, "HTTP 502");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let store =
            PostgrestStore::new("https://abc.supabase.co/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(store.rest_url, "https://abc.supabase.co/rest/v1");
    }
}
