//! Suppliers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::SupplierInput;
use mbg_core::Supplier;

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser, ListParams};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/suppliers", get(list).post(create))
        .route("/api/suppliers/{id}", get(get_one).put(update).delete(remove))
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<JsonResponse<Vec<Supplier>>> {
    Ok(page(state.db.suppliers().list(&params.query()).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Supplier>> {
    Ok(ok(state.db.suppliers().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<(StatusCode, JsonResponse<Supplier>)> {
    auth.require(WAREHOUSE)?;
    Ok(created(state.db.suppliers().create(&input).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<JsonResponse<Supplier>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.suppliers().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(WAREHOUSE)?;
    state.db.suppliers().delete(&id).await?;
    Ok(message("Supplier deleted"))
}
