//! Research project models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{new_id, timestamp, ProjectStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn is_open(&self) -> bool {
        self.status == "open"
    }

    pub fn from_request(req: &CreateProjectRequest) -> Self {
        let now = timestamp();
        let status = req
            .status
            .as_deref()
            .and_then(|s| s.parse::<ProjectStatus>().ok())
            .unwrap_or_default();
        Self {
            id: new_id(),
            title: req.title.trim().to_string(),
            description: req.description.clone().filter(|d| !d.trim().is_empty()),
            department: req.department.clone().filter(|d| !d.trim().is_empty()),
            supervisor_id: req.supervisor_id.clone().filter(|s| !s.is_empty()),
            status: status.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub supervisor_id: Option<String>,
    pub status: Option<String>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Filters for listing projects
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
    pub department: Option<String>,
    pub limit: Option<i64>,
}

/// Body of `GET /api/debug/table-schema`
#[derive(Debug, Serialize, Deserialize)]
pub struct TableSchema {
    pub success: bool,
    pub table: String,
    pub columns: Vec<String>,
    pub sample: Option<serde_json::Map<String, serde_json::Value>>,
}
