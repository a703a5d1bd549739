//! Unified API error handling.
//!
//! Every failure leaves a handler as the same flat JSON envelope:
//! `{"success": false, "error": "...", "code": "...", "details": ...}`
//! with the status chosen by the error code (or overridden, e.g. for the
//! soft failures `/api/users` reports with HTTP 200).

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::StoreError;

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Client errors (4xx)
    BadRequest,
    NotFound,
    Conflict,
    ValidationError,

    // Server errors (5xx)
    DatabaseError,
}

impl ErrorCode {
    /// Get the default HTTP status code for this error code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::DatabaseError => "database_error",
        }
    }
}

/// Additional error details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// Underlying cause, surfaced verbatim
    Message(String),
    /// Field-level validation errors
    ValidationErrors(HashMap<String, Vec<String>>),
}

/// The error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    status: StatusCode,
    message: String,
    details: Option<ErrorDetails>,
}

impl ApiError {
    /// Create a new API error with a specific code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status_code(),
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error with a custom HTTP status code
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Report the error in the body but answer HTTP 200
    pub fn soft(self) -> Self {
        self.with_status(StatusCode::OK)
    }

    /// Add details to the error
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the underlying cause as a details string
    pub fn with_cause(self, cause: impl std::fmt::Display) -> Self {
        self.with_details(ErrorDetails::Message(cause.to_string()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    // -------------------------------------------------------------------------
    // Convenience constructors for common error types
    // -------------------------------------------------------------------------

    /// Bad request error (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Conflict error (409) - resource already exists
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Validation error (400) with field-level details
    pub fn validation(errors: HashMap<String, Vec<String>>) -> Self {
        let message = if errors.len() == 1 {
            errors
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", errors.len())
        };

        Self::new(ErrorCode::ValidationError, message)
            .with_details(ErrorDetails::ValidationErrors(errors))
    }

    /// Single field validation error
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::validation(errors)
    }

    /// Database error (500)
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ErrorResponse {
            success: false,
            error: self.message,
            code: self.code.as_str().to_string(),
            details: self.details,
        };

        (self.status, Json(response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

// -------------------------------------------------------------------------
// Conversion implementations for store errors
// -------------------------------------------------------------------------

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Database error: {}", err);

        match &err {
            StoreError::Sqlx(sqlx::Error::RowNotFound) => {
                ApiError::not_found("Resource not found")
            }
            StoreError::Sqlx(sqlx::Error::Database(db_err)) => {
                let msg = db_err.message();
                if msg.contains("UNIQUE constraint failed") {
                    ApiError::conflict("A resource with this identifier already exists")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    ApiError::bad_request("Referenced resource does not exist")
                } else {
                    ApiError::database("A database error occurred").with_cause(&err)
                }
            }
            // 23505 unique_violation, 23503 foreign_key_violation
            StoreError::Api { code: Some(code), .. } if code == "23505" => {
                ApiError::conflict("A resource with this identifier already exists")
            }
            StoreError::Api { code: Some(code), .. } if code == "23503" => {
                ApiError::bad_request("Referenced resource does not exist")
            }
            _ => ApiError::database("A database error occurred").with_cause(&err),
        }
    }
}

// -------------------------------------------------------------------------
// Conversion implementations for extractor rejections
// -------------------------------------------------------------------------

lazy_static! {
    /// serde's wording for an absent required field
    static ref MISSING_FIELD_REGEX: Regex = Regex::new(r"missing field `([^`]+)`").unwrap();
}

/// Map a serde error message onto the field it names, if any.
fn deserialize_error(source: &str, fallback_field: &str, message: String) -> ApiError {
    match MISSING_FIELD_REGEX.captures(&message) {
        Some(caps) => {
            let field = &caps[1];
            ApiError::validation_field(field, format!("{} is required", field))
        }
        None => {
            ApiError::validation_field(fallback_field, format!("Invalid {}: {}", source, message))
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected JSON body");

        match rejection {
            JsonRejection::JsonDataError(e) => {
                deserialize_error("request body", "body", e.body_text())
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::validation_field("body", "Request body is not valid JSON")
            }
            JsonRejection::MissingJsonContentType(_) => ApiError::validation_field(
                "body",
                "Expected a JSON body with Content-Type: application/json",
            ),
            other => ApiError::bad_request("Failed to read request body")
                .with_cause(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected query string");
        deserialize_error("query string", "query", rejection.body_text())
    }
}

// -------------------------------------------------------------------------
// Builder for validation errors
// -------------------------------------------------------------------------

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: HashMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    /// Create a new validation error builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Build the ApiError if there are any errors
    pub fn build(self) -> Option<ApiError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(ApiError::validation(self.errors))
        }
    }

    /// Return Ok(()) if no errors, or Err(ApiError) if there are errors
    pub fn finish(self) -> Result<(), ApiError> {
        match self.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_codes() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::DatabaseError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_soft_error_keeps_code() {
        let err = ApiError::database("connection refused").soft();
        assert_eq!(err.status, StatusCode::OK);
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_validation_error_builder() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("title", "Title is required");
        builder.add("email", "Invalid email format");
        builder.add("title", "Title is too short");

        assert!(!builder.is_empty());

        let err = builder.build().unwrap();
        assert_eq!(err.code, ErrorCode::ValidationError);

        if let Some(ErrorDetails::ValidationErrors(errors)) = &err.details {
            assert_eq!(errors.get("title").unwrap().len(), 2);
            assert_eq!(errors.get("email").unwrap().len(), 1);
        } else {
            panic!("Expected ValidationErrors details");
        }
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err = ApiError::from(StoreError::Sqlx(sqlx::Error::RowNotFound));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_postgrest_unique_violation_maps_to_conflict() {
        let err = ApiError::from(StoreError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
            code: Some("23505".to_string()),
        });
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_other_store_errors_carry_cause() {
        let err = ApiError::from(StoreError::Decode("bad json".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.details,
            Some(ErrorDetails::Message("unexpected response from database: bad json".to_string()))
        );
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let err = deserialize_error(
            "request body",
            "body",
            concat!(
                "Failed to deserialize the JSON body into the target type: ",
                "missing field `name` at line 1 column 22"
            )
            .to_string(),
        );
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "name is required");
    }

    #[test]
    fn test_other_deserialize_errors_use_fallback_field() {
        let err = deserialize_error(
            "query string",
            "query",
            "invalid digit found in string".to_string(),
        );
        match err.details {
            Some(ErrorDetails::ValidationErrors(errors)) => assert!(errors.contains_key("query")),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ApiError::not_found("Post not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Post not found");
        assert_eq!(json["code"], "not_found");
        assert!(json.get("details").is_none());
    }
}
