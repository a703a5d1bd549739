//! Database seeders for the local backend
//!
//! The hosted database is provisioned externally; the local SQLite backend
//! seeds the test accounts so the login page works out of the box.

use sqlx::SqlitePool;
use tracing::info;

use super::models::{new_id, timestamp, UserRole};

/// Display name and role derived from a test account's local part,
/// e.g. `teacher@test.edu` becomes ("Test Teacher", teacher).
pub fn test_account_profile(email: &str) -> (String, UserRole) {
    let local = email.split('@').next().unwrap_or(email);
    let role = local.parse::<UserRole>().unwrap_or_default();

    let mut chars = local.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };

    (format!("Test {}", capitalized), role)
}

/// Insert the configured test accounts if they are missing
pub async fn seed_test_accounts(pool: &SqlitePool, emails: &[String]) -> Result<(), sqlx::Error> {
    let mut inserted = 0u64;
    for email in emails {
        let email = email.trim().to_lowercase();
        let (name, role) = test_account_profile(&email);

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (id, email, name, role, department, created_at)
            VALUES (?, ?, ?, ?, NULL, ?)
            "#,
        )
        .bind(new_id())
        .bind(&email)
        .bind(&name)
        .bind(role.as_str())
        .bind(timestamp())
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    if inserted > 0 {
        info!("Seeded {} test accounts", inserted);
    }
    Ok(())
}
