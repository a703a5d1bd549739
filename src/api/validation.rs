//! Input validation for API requests and page forms.
//!
//! Each function returns `Err(message)` describing the first problem found.
//! Collect several of them into an `ApiError` with `ValidationErrorBuilder`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::{
    CreateApplicationRequest, CreatePostRequest, CreateProjectRequest, CreateUserRequest,
    ProjectStatus, UpdatePostRequest, UpdateProjectRequest, UserRole,
};

use super::error::{ApiError, ValidationErrorBuilder};

lazy_static! {
    /// Pragmatic email check: one @, no spaces, a dot in the domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^@\s]+@[^@\s]+\.[^@\s]+$"
    ).unwrap();

    /// Row identifiers: UUIDs or other URL-safe keys
    static ref ID_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_-]{1,64}$"
    ).unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a required text field with length bounds
pub fn validate_text(value: &str, label: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(format!("{} is required", label));
    }

    if len < min {
        return Err(format!("{} is too short (min {} characters)", label, min));
    }

    if len > max {
        return Err(format!("{} is too long (max {} characters)", label, max));
    }

    Ok(())
}

/// Validate an optional text field (empty is treated as absent)
pub fn validate_optional_text(
    value: &Option<String>,
    label: &str,
    max: usize,
) -> Result<(), String> {
    if let Some(v) = value {
        if v.chars().count() > max {
            return Err(format!("{} is too long (max {} characters)", label, max));
        }
    }

    Ok(())
}

/// Validate a row identifier taken from a path
pub fn validate_id(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if !ID_REGEX.is_match(id) {
        return Err(format!("Invalid {} format", field_name));
    }

    Ok(())
}

/// Validate an optional role value
pub fn validate_role(role: &Option<String>) -> Result<(), String> {
    match role.as_deref() {
        None | Some("") => Ok(()),
        Some(r) => r
            .parse::<UserRole>()
            .map(|_| ())
            .map_err(|_| "Invalid role. Must be one of: student, teacher, admin".to_string()),
    }
}

/// Validate an optional project status value
pub fn validate_status(status: &Option<String>) -> Result<(), String> {
    match status.as_deref() {
        None | Some("") => Ok(()),
        Some(s) => s
            .parse::<ProjectStatus>()
            .map(|_| ())
            .map_err(|_| "Invalid status. Must be one of: open, closed".to_string()),
    }
}

/// Path id check producing a ready-to-return error
pub fn require_id(id: &str, field_name: &str) -> Result<(), ApiError> {
    validate_id(id, field_name).map_err(|e| ApiError::validation_field(field_name, e))
}

pub fn validate_create_user(req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_text(&req.name, "Name", 2, 100) {
        errors.add("name", e);
    }
    if let Err(e) = validate_role(&req.role) {
        errors.add("role", e);
    }
    if let Err(e) = validate_optional_text(&req.department, "Department", 100) {
        errors.add("department", e);
    }

    errors.finish()
}

pub fn validate_create_project(req: &CreateProjectRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_text(&req.title, "Project title", 3, 200) {
        errors.add("title", e);
    }
    if let Err(e) = validate_optional_text(&req.description, "Project description", 5000) {
        errors.add("description", e);
    }
    if let Err(e) = validate_optional_text(&req.department, "Department", 100) {
        errors.add("department", e);
    }
    if let Err(e) = validate_status(&req.status) {
        errors.add("status", e);
    }

    errors.finish()
}

pub fn validate_update_project(req: &UpdateProjectRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref title) = req.title {
        if let Err(e) = validate_text(title, "Project title", 3, 200) {
            errors.add("title", e);
        }
    }
    if let Err(e) = validate_optional_text(&req.description, "Project description", 5000) {
        errors.add("description", e);
    }
    if let Err(e) = validate_optional_text(&req.department, "Department", 100) {
        errors.add("department", e);
    }
    if let Err(e) = validate_status(&req.status) {
        errors.add("status", e);
    }

    errors.finish()
}

pub fn validate_create_post(req: &CreatePostRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_text(&req.title, "Title", 3, 200) {
        errors.add("title", e);
    }
    if let Err(e) = validate_text(&req.content, "Content", 1, 50_000) {
        errors.add("content", e);
    }

    errors.finish()
}

pub fn validate_update_post(req: &UpdatePostRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref title) = req.title {
        if let Err(e) = validate_text(title, "Title", 3, 200) {
            errors.add("title", e);
        }
    }
    if let Some(ref content) = req.content {
        if let Err(e) = validate_text(content, "Content", 1, 50_000) {
            errors.add("content", e);
        }
    }

    errors.finish()
}

pub fn validate_create_application(req: &CreateApplicationRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_id(&req.project_id, "project") {
        errors.add("project_id", e);
    }
    if let Err(e) = validate_text(&req.name, "Name", 2, 100) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_text(&req.statement, "Statement", 20, 5000) {
        errors.add("statement", e);
    }

    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("student@test.edu").is_ok());
        assert!(validate_email("  a.b+c@dept.uni.ac.uk ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@test.edu").is_err());
        assert!(validate_email("spaces in@test.edu").is_err());
        assert!(validate_email("nodot@localhost").is_err());
    }

    #[test]
    fn test_validate_text_bounds() {
        assert!(validate_text("Quantum dots", "Title", 3, 200).is_ok());
        assert!(validate_text("   ", "Title", 3, 200).is_err());
        assert!(validate_text("ab", "Title", 3, 200).is_err());
        assert!(validate_text(&"x".repeat(201), "Title", 3, 200).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("550e8400-e29b-41d4-a716-446655440000", "project_id").is_ok());
        assert!(validate_id("42", "project_id").is_ok());

        assert!(validate_id("", "project_id").is_err());
        assert!(validate_id("1,2", "project_id").is_err());
        assert!(validate_id("a b", "project_id").is_err());
        assert!(validate_id(&"x".repeat(65), "project_id").is_err());
    }

    #[test]
    fn test_validate_role_and_status() {
        assert!(validate_role(&None).is_ok());
        assert!(validate_role(&Some("Teacher".to_string())).is_ok());
        assert!(validate_role(&Some("dean".to_string())).is_err());

        assert!(validate_status(&Some("closed".to_string())).is_ok());
        assert!(validate_status(&Some("archived".to_string())).is_err());
    }

    #[test]
    fn test_validate_create_application_collects_fields() {
        let req = CreateApplicationRequest {
            project_id: "bad id".to_string(),
            name: "A".to_string(),
            email: "nope".to_string(),
            statement: "too short".to_string(),
        };
        let err = validate_create_application(&req).unwrap_err();
        assert!(err.to_string().contains("4 fields"));
    }

    #[test]
    fn test_validate_update_project_checks_department() {
        let req = UpdateProjectRequest {
            department: Some("d".repeat(101)),
            ..Default::default()
        };
        let err = validate_update_project(&req).unwrap_err();
        assert_eq!(err.message(), "Department is too long (max 100 characters)");

        let req = UpdateProjectRequest {
            department: Some("Physics".to_string()),
            ..Default::default()
        };
        assert!(validate_update_project(&req).is_ok());
    }
}
