//! Goods receipts. Posting one credits stock at the order's destination
//! and advances the purchase order, all in one transaction.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::GoodsReceiptInput;
use mbg_core::{GoodsReceipt, GoodsReceiptDetail};
use mbg_db::GoodsReceiptFilter;
use serde::Deserialize;
use tracing::info;

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/goods-receipts", get(list).post(create))
        .route("/api/goods-receipts/{id}", get(get_one))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsReceiptParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub purchase_order_id: Option<String>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<GoodsReceiptParams>,
) -> ApiResult<JsonResponse<Vec<GoodsReceipt>>> {
    let filter = GoodsReceiptFilter {
        page: page_request(params.page, params.limit),
        search: params.search,
        purchase_order_id: params.purchase_order_id,
    };
    Ok(page(state.db.goods_receipts().list(&filter).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<GoodsReceiptDetail>> {
    Ok(ok(state.db.goods_receipts().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<GoodsReceiptInput>,
) -> ApiResult<(StatusCode, JsonResponse<GoodsReceiptDetail>)> {
    auth.require(WAREHOUSE)?;
    let receipt = state
        .db
        .goods_receipts()
        .create(&input, Some(auth.id()))
        .await?;
    info!(
        receipt = %receipt.receipt.receipt_number,
        user_id = %auth.id(),
        "Goods received"
    );
    Ok(created(receipt))
}
