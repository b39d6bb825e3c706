//! Stock rows, manual postings and the movement ledger.
//!
//! Reads are open to every signed-in user. Opening balances, adjustments
//! and transfers need WAREHOUSE_STAFF.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use mbg_core::input::{NewStock, StockAdjustment, StockTransfer};
use mbg_core::stock::StockSummary;
use mbg_core::{MovementType, StockMovement, StockView};
use mbg_db::{MovementFilter, StockFilter};
use serde::{Deserialize, Serialize};

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/stock", get(list).post(create))
        .route("/api/stock/adjust", post(adjust))
        .route("/api/stock/transfer", post(transfer))
        .route("/api/stock/movements", get(movements))
        .route("/api/stock/summary", get(summary))
        .route("/api/stock/{id}", get(get_one))
}

/// `?itemId=&locationId=&search=&inStock=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub item_id: Option<String>,
    pub location_id: Option<String>,
    pub in_stock: Option<bool>,
}

/// `?stockId=&itemId=&locationId=&type=&referenceId=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub stock_id: Option<String>,
    pub item_id: Option<String>,
    pub location_id: Option<String>,
    #[serde(rename = "type")]
    pub movement_type: Option<MovementType>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustmentResult {
    pub stock: StockView,
    pub movement: StockMovement,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<StockParams>,
) -> ApiResult<JsonResponse<Vec<StockView>>> {
    let filter = StockFilter {
        page: page_request(params.page, params.limit),
        item_id: params.item_id,
        location_id: params.location_id,
        search: params.search,
        in_stock_only: params.in_stock.unwrap_or(false),
    };
    Ok(page(state.db.stock().list(&filter).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<StockView>> {
    Ok(ok(state.db.stock().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewStock>,
) -> ApiResult<(StatusCode, JsonResponse<StockView>)> {
    auth.require(WAREHOUSE)?;
    Ok(created(state.db.stock().create(&input, Some(auth.id())).await?))
}

async fn adjust(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<StockAdjustment>,
) -> ApiResult<JsonResponse<AdjustmentResult>> {
    auth.require(WAREHOUSE)?;
    let (stock, movement) = state.db.stock().adjust(&input, Some(auth.id())).await?;
    Ok(ok(AdjustmentResult { stock, movement }))
}

async fn transfer(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<StockTransfer>,
) -> ApiResult<JsonResponse<Vec<StockMovement>>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.stock().transfer(&input, Some(auth.id())).await?))
}

async fn movements(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<MovementParams>,
) -> ApiResult<JsonResponse<Vec<StockMovement>>> {
    let filter = MovementFilter {
        page: page_request(params.page, params.limit),
        stock_id: params.stock_id,
        item_id: params.item_id,
        location_id: params.location_id,
        movement_type: params.movement_type,
        reference_id: params.reference_id,
    };
    Ok(page(state.db.stock().movements(&filter).await?))
}

async fn summary(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<SummaryParams>,
) -> ApiResult<JsonResponse<Vec<StockSummary>>> {
    Ok(ok(state.db.stock().summary(params.location_id.as_deref()).await?))
}
