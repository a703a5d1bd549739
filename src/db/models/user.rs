//! User models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{new_id, timestamp, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    pub created_at: String,
}

impl User {
    /// Parsed role; unknown values are treated as students.
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or_default()
    }

    /// Build a new row from a create request, normalising role and email.
    pub fn from_request(req: &CreateUserRequest) -> Self {
        let role = req
            .role
            .as_deref()
            .and_then(|r| r.parse::<UserRole>().ok())
            .unwrap_or_default();
        Self {
            id: new_id(),
            email: req.email.trim().to_lowercase(),
            name: req.name.trim().to_string(),
            role: role.to_string(),
            department: req.department.clone().filter(|d| !d.trim().is_empty()),
            created_at: timestamp(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Option<String>,
    pub department: Option<String>,
}

/// Body of `GET /api/users`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersOverview {
    pub success: bool,
    pub total_users: i64,
    pub recent_users: Vec<User>,
}

/// Body of `GET /api/test-login`
#[derive(Debug, Serialize, Deserialize)]
pub struct TestAccounts {
    pub success: bool,
    pub users: Vec<User>,
}
