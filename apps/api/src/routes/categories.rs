//! Item categories.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::CategoryInput;
use mbg_core::Category;

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser, ListParams};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/categories", get(list).post(create))
        .route("/api/categories/{id}", get(get_one).put(update).delete(remove))
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<JsonResponse<Vec<Category>>> {
    Ok(page(state.db.categories().list(&params.query()).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Category>> {
    Ok(ok(state.db.categories().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, JsonResponse<Category>)> {
    auth.require(WAREHOUSE)?;
    Ok(created(state.db.categories().create(&input).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<JsonResponse<Category>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.categories().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(WAREHOUSE)?;
    state.db.categories().delete(&id).await?;
    Ok(message("Category deleted"))
}
