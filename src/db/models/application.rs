//! Project application models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{new_id, timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Application {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub email: String,
    pub statement: String,
    pub created_at: String,
}

impl Application {
    pub fn from_request(req: &CreateApplicationRequest) -> Self {
        Self {
            id: new_id(),
            project_id: req.project_id.clone(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            statement: req.statement.trim().to_string(),
            created_at: timestamp(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicationRequest {
    pub project_id: String,
    pub name: String,
    pub email: String,
    pub statement: String,
}
