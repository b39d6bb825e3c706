//! Purchase orders. Editable while DRAFT; receipts are posted through
//! `/api/goods-receipts`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use mbg_core::input::PurchaseOrderInput;
use mbg_core::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderStatus};
use mbg_db::PurchaseOrderFilter;
use serde::Deserialize;

use super::WAREHOUSE;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/purchase-orders", get(list).post(create))
        .route(
            "/api/purchase-orders/{id}",
            get(get_one).put(update).delete(remove),
        )
        .route("/api/purchase-orders/{id}/submit", post(submit))
        .route("/api/purchase-orders/{id}/cancel", post(cancel))
}

/// `?search=&status=&supplierId=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<String>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<PurchaseOrderParams>,
) -> ApiResult<JsonResponse<Vec<PurchaseOrder>>> {
    let filter = PurchaseOrderFilter {
        page: page_request(params.page, params.limit),
        search: params.search,
        status: params.status,
        supplier_id: params.supplier_id,
    };
    Ok(page(state.db.purchase_orders().list(&filter).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<PurchaseOrderDetail>> {
    Ok(ok(state.db.purchase_orders().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<PurchaseOrderInput>,
) -> ApiResult<(StatusCode, JsonResponse<PurchaseOrderDetail>)> {
    auth.require(WAREHOUSE)?;
    let order = state
        .db
        .purchase_orders()
        .create(&input, Some(auth.id()))
        .await?;
    Ok(created(order))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PurchaseOrderInput>,
) -> ApiResult<JsonResponse<PurchaseOrderDetail>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.purchase_orders().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(WAREHOUSE)?;
    state.db.purchase_orders().delete(&id).await?;
    Ok(message("Purchase order deleted"))
}

async fn submit(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<PurchaseOrder>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.purchase_orders().submit(&id).await?))
}

async fn cancel(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<PurchaseOrder>> {
    auth.require(WAREHOUSE)?;
    Ok(ok(state.db.purchase_orders().cancel(&id).await?))
}
