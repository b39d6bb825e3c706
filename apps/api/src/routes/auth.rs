//! Registration, sign-in and token refresh.
//!
//! ```text
//! register ──► unapproved account (first account: approved ADMIN)
//!                  │ admin: POST /api/users/{id}/approve
//!                  ▼
//! login ─────► { user, accessToken, refreshToken, expiresIn }
//! refresh ───► new pair, as long as the account can still sign in
//! ```

use axum::routing::{get, post};
use axum::{extract::State, http::StatusCode, Router};
use mbg_core::input::RegisterUser;
use mbg_core::User;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthError, TokenPair};
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::response::{created, ok, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Rejects accounts that may not hold tokens.
fn ensure_can_sign_in(user: &User) -> Result<(), AuthError> {
    if !user.is_active {
        Err(AuthError::Inactive)
    } else if !user.is_approved {
        Err(AuthError::NotApproved)
    } else {
        Ok(())
    }
}

async fn register(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<RegisterUser>,
) -> ApiResult<(StatusCode, JsonResponse<User>)> {
    input.validate()?;
    let hash = hash_password(&input.password)?;
    let user = state.db.users().register(&input, &hash).await?;

    let (status, mut body) = created(user);
    if !body.0.data.is_approved {
        body.0.message = Some("Registration received, awaiting administrator approval".into());
    }
    Ok((status, body))
}

async fn login(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> ApiResult<JsonResponse<Session>> {
    let user = state
        .db
        .users()
        .find_by_email(input.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&input.password, &user.password_hash) {
        warn!(user_id = %user.id, "Failed sign-in attempt");
        return Err(AuthError::InvalidCredentials.into());
    }
    ensure_can_sign_in(&user)?;

    let tokens = state.jwt.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "User signed in");
    Ok(ok(Session { user, tokens }))
}

async fn refresh(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<RefreshRequest>,
) -> ApiResult<JsonResponse<Session>> {
    let claims = state.jwt.verify_refresh_token(&input.refresh_token)?;

    let user = match state.db.users().get(&claims.sub).await {
        Ok(user) => user,
        Err(mbg_db::DbError::NotFound { .. }) => return Err(AuthError::InvalidToken.into()),
        Err(e) => return Err(e.into()),
    };
    ensure_can_sign_in(&user)?;

    let tokens = state.jwt.issue(&user)?;
    Ok(ok(Session { user, tokens }))
}

async fn me(auth: AuthUser) -> JsonResponse<User> {
    ok(auth.0)
}
