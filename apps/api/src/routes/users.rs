//! Account administration. Every route here is ADMIN only.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use mbg_core::input::UpdateUser;
use mbg_core::User;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser, ListParams};
use crate::response::{message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/users", get(list))
        .route("/api/users/{id}", get(get_one).put(update).delete(remove))
        .route("/api/users/{id}/approve", post(approve))
}

async fn list(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<JsonResponse<Vec<User>>> {
    auth.require_admin()?;
    Ok(page(state.db.users().list(&params.query()).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<User>> {
    auth.require_admin()?;
    Ok(ok(state.db.users().get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdateUser>,
) -> ApiResult<JsonResponse<User>> {
    auth.require_admin()?;
    Ok(ok(state.db.users().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require_admin()?;
    state.db.users().delete(&id).await?;
    Ok(message("User deleted"))
}

async fn approve(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<User>> {
    auth.require_admin()?;
    Ok(ok(state.db.users().approve(&id).await?))
}
