//! Warehouses, kitchens and distribution points.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::LocationInput;
use mbg_core::{Location, LocationType};
use mbg_db::ListQuery;
use serde::Deserialize;

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/locations", get(list).post(create))
        .route("/api/locations/{id}", get(get_one).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<LocationParams>,
) -> ApiResult<JsonResponse<Vec<Location>>> {
    let query = ListQuery::new(page_request(params.page, params.limit), params.search);
    Ok(page(state.db.locations().list(&query, params.location_type).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Location>> {
    Ok(ok(state.db.locations().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<LocationInput>,
) -> ApiResult<(StatusCode, JsonResponse<Location>)> {
    auth.require(WAREHOUSE)?;
    Ok(created(state.db.locations().create(&input).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<LocationInput>,
) -> ApiResult<JsonResponse<Location>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.locations().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(WAREHOUSE)?;
    state.db.locations().delete(&id).await?;
    Ok(message("Location deleted"))
}
