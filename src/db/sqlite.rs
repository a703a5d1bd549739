//! Local SQLite backend, used for development and tests when no hosted
//! database is configured.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use super::models::{
    timestamp, Application, BlogPost, CreateApplicationRequest, CreatePostRequest,
    CreateProjectRequest, CreateUserRequest, Project, ProjectQuery, UpdatePostRequest,
    UpdateProjectRequest, User,
};
use super::store::{clamp_limit, Store, StoreError, StoreResult, DEFAULT_LIST_LIMIT};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn recent_users(&self, limit: i64) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; emails.len()].join(", ");
        let sql = format!(
            "SELECT * FROM users WHERE email IN ({}) ORDER BY email",
            placeholders
        );
        let mut query = sqlx::query_as::<_, User>(&sql);
        for email in emails {
            query = query.bind(email.as_str());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, req: &CreateUserRequest) -> StoreResult<User> {
        let user = User::from_request(req);
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, department, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.role)
        .bind(&user.department)
        .bind(&user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<Project>> {
        let status = query.status.as_deref().filter(|s| !s.is_empty());
        let department = query.department.as_deref().filter(|d| !d.is_empty());

        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR department = ?2)
            ORDER BY created_at DESC
            LIMIT ?3
            "#,
        )
        .bind(status)
        .bind(department)
        .bind(clamp_limit(query.limit, DEFAULT_LIST_LIMIT))
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn create_project(&self, req: &CreateProjectRequest) -> StoreResult<Project> {
        let project = Project::from_request(req);
        sqlx::query(
            r#"
            INSERT INTO projects
                (id, title, description, department, supervisor_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.department)
        .bind(&project.supervisor_id)
        .bind(&project.status)
        .bind(&project.created_at)
        .bind(&project.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update_project(
        &self,
        id: &str,
        req: &UpdateProjectRequest,
    ) -> StoreResult<Option<Project>> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                department = COALESCE(?, department),
                supervisor_id = COALESCE(?, supervisor_id),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.department)
        .bind(&req.supervisor_id)
        .bind(&req.status)
        .bind(timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    async fn delete_project(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sample_project(&self) -> StoreResult<Option<Map<String, Value>>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        match project {
            Some(project) => match serde_json::to_value(project) {
                Ok(Value::Object(row)) => Ok(Some(row)),
                Ok(_) => Err(StoreError::Decode("project row is not an object".to_string())),
                Err(e) => Err(StoreError::Decode(e.to_string())),
            },
            None => Ok(None),
        }
    }

    async fn list_posts(
        &self,
        published_only: bool,
        limit: Option<i64>,
    ) -> StoreResult<Vec<BlogPost>> {
        let posts = sqlx::query_as::<_, BlogPost>(
            r#"
            SELECT * FROM blog_posts
            WHERE (?1 = 0 OR published = 1)
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(published_only)
        .bind(clamp_limit(limit, DEFAULT_LIST_LIMIT))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_post(&self, req: &CreatePostRequest) -> StoreResult<BlogPost> {
        let post = BlogPost::from_request(req);
        sqlx::query(
            r#"
            INSERT INTO blog_posts
                (id, title, content, author_id, published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author_id)
        .bind(post.published)
        .bind(&post.created_at)
        .bind(&post.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update_post(
        &self,
        id: &str,
        req: &UpdatePostRequest,
    ) -> StoreResult<Option<BlogPost>> {
        let result = sqlx::query(
            r#"
            UPDATE blog_posts SET
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                published = COALESCE(?, published),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.published)
        .bind(timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    async fn delete_post(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_application(
        &self,
        req: &CreateApplicationRequest,
    ) -> StoreResult<Application> {
        let application = Application::from_request(req);
        sqlx::query(
            r#"
            INSERT INTO applications (id, project_id, name, email, statement, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&application.id)
        .bind(&application.project_id)
        .bind(&application.name)
        .bind(&application.email)
        .bind(&application.statement)
        .bind(&application.created_at)
        .execute(&self.pool)
        .await?;
        Ok(application)
    }

    async fn list_applications(&self, project_id: &str) -> StoreResult<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE project_id = ? ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }
}
