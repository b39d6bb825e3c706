//! Item master: raw materials and finished goods.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::ItemInput;
use mbg_core::{Item, ItemType};
use mbg_db::{ItemFilter, ListQuery};
use serde::Deserialize;

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/items", get(list).post(create))
        .route("/api/items/{id}", get(get_one).put(update).delete(remove))
}

/// `?search=&itemType=&categoryId=&activeOnly=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub item_type: Option<ItemType>,
    pub category_id: Option<String>,
    pub active_only: Option<bool>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<ItemParams>,
) -> ApiResult<JsonResponse<Vec<Item>>> {
    let query = ListQuery::new(page_request(params.page, params.limit), params.search);
    let filter = ItemFilter {
        item_type: params.item_type,
        category_id: params.category_id,
        active_only: params.active_only.unwrap_or(false),
    };
    Ok(page(state.db.items().list(&query, &filter).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Item>> {
    Ok(ok(state.db.items().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<ItemInput>,
) -> ApiResult<(StatusCode, JsonResponse<Item>)> {
    auth.require(WAREHOUSE)?;
    Ok(created(state.db.items().create(&input).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ItemInput>,
) -> ApiResult<JsonResponse<Item>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.items().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(WAREHOUSE)?;
    state.db.items().delete(&id).await?;
    Ok(message("Item deleted"))
}
