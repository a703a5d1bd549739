//! Common types and utilities shared across models.

use serde::{Deserialize, Serialize};

/// Current time in the RFC 3339 form stored in every `created_at`/`updated_at` column.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Generate a new row identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Portal role of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }

    /// Teachers and admins may moderate blog content.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" | "faculty" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Whether a research project still accepts applications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Open,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}
