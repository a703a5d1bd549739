//! Test-account login support.
//!
//! The portal signs users in with one of the configured test accounts; the
//! chosen account's email is kept in a cookie and resolved against the
//! `users` table on every request.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{StoreResult, TestAccounts, User};
use crate::AppState;

use super::error::ApiError;

/// Allow-list from config, already trimmed and lower-cased at load time
pub fn test_account_emails(state: &AppState) -> Vec<String> {
    state.config.auth.test_accounts.clone()
}

/// Fetch the allow-listed test accounts (at most one row per listed email)
pub async fn fetch_test_accounts(state: &AppState) -> StoreResult<Vec<User>> {
    let emails = test_account_emails(state);
    let users = state.store.users_by_emails(&emails).await?;

    Ok(users
        .into_iter()
        .filter(|u| state.config.is_test_account(&u.email))
        .collect())
}

/// GET /api/test-login
pub async fn test_login(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TestAccounts>, ApiError> {
    let users = fetch_test_accounts(&state)
        .await
        .map_err(|e| ApiError::database("Failed to fetch test accounts").with_cause(e))?;

    Ok(Json(TestAccounts {
        success: true,
        users,
    }))
}

/// Resolve a signed-in email to a user, rejecting anything off the allow-list.
pub async fn resolve_session(state: &AppState, email: &str) -> StoreResult<Option<User>> {
    if !state.config.is_test_account(email) {
        return Ok(None);
    }
    state.store.get_user_by_email(email).await
}

/// Cookie carrying the signed-in email
pub fn session_cookie(state: &AppState, email: &str) -> Cookie<'static> {
    Cookie::build((state.config.auth.session_cookie.clone(), email.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Sign a test account in; returns the updated jar, or `None` if the email
/// is not an existing allow-listed account.
pub async fn sign_in(
    state: &AppState,
    jar: CookieJar,
    email: &str,
) -> StoreResult<Option<(CookieJar, User)>> {
    let email = email.trim().to_lowercase();
    match resolve_session(state, &email).await? {
        Some(user) => {
            info!(email = %user.email, role = %user.role, "Test account signed in");
            Ok(Some((jar.add(session_cookie(state, &user.email)), user)))
        }
        None => Ok(None),
    }
}

pub fn sign_out(state: &AppState, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((state.config.auth.session_cookie.clone(), "")).path("/"))
}

/// The signed-in user, if any
#[derive(Debug, Clone)]
pub struct SessionUser(pub Option<User>);

impl SessionUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn can_moderate(&self) -> bool {
        self.0.as_ref().map(|u| u.role().can_moderate()).unwrap_or(false)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let email = match jar.get(&state.config.auth.session_cookie) {
            Some(cookie) => cookie.value().to_string(),
            None => return Ok(SessionUser(None)),
        };

        match resolve_session(state, &email).await {
            Ok(user) => Ok(SessionUser(user)),
            Err(e) => {
                warn!(error = %e, "Failed to resolve session user");
                Ok(SessionUser(None))
            }
        }
    }
}
