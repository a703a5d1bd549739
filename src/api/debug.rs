// Diagnostics for checking what the hosted `projects` table looks like.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::TableSchema;
use crate::AppState;

use super::error::ApiError;

/// A sample row of `projects` and its column names. An empty table yields
/// no columns, since the hosted API only reveals columns through rows.
///
/// GET /api/debug/table-schema
pub async fn table_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableSchema>, ApiError> {
    let sample = state
        .store
        .sample_project()
        .await
        .map_err(|e| ApiError::database("Failed to inspect table schema").with_cause(e))?;

    let columns = sample
        .as_ref()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    Ok(Json(TableSchema {
        success: true,
        table: "projects".to_string(),
        columns,
        sample,
    }))
}
