//! Delivery orders from a source location to a beneficiary.
//!
//! ```text
//! POST /api/delivery-orders                PENDING     (lines reserved at source)
//! POST /api/delivery-orders/{id}/dispatch  DISPATCHED  (reserved stock leaves)
//! POST /api/delivery-orders/{id}/deliver   DELIVERED   (receiver confirms)
//! POST /api/delivery-orders/{id}/cancel    CANCELLED   (PENDING only, releases)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDate;
use mbg_core::input::{ConfirmDelivery, DeliveryOrderInput};
use mbg_core::{DeliveryOrder, DeliveryOrderDetail, DeliveryOrderStatus, StockMovement};
use mbg_db::DeliveryOrderFilter;
use serde::{Deserialize, Serialize};

use super::{DELIVERY_CONFIRMATION, DISTRIBUTION};
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/delivery-orders", get(list).post(create))
        .route("/api/delivery-orders/{id}", get(get_one))
        .route("/api/delivery-orders/{id}/dispatch", post(dispatch))
        .route("/api/delivery-orders/{id}/deliver", post(deliver))
        .route("/api/delivery-orders/{id}/cancel", post(cancel))
}

/// `?search=&status=&beneficiaryId=&from=&to=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrderParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<DeliveryOrderStatus>,
    pub beneficiary_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    pub delivery_order: DeliveryOrder,
    pub movements: Vec<StockMovement>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<DeliveryOrderParams>,
) -> ApiResult<JsonResponse<Vec<DeliveryOrder>>> {
    let filter = DeliveryOrderFilter {
        page: page_request(params.page, params.limit),
        search: params.search,
        status: params.status,
        beneficiary_id: params.beneficiary_id,
        from: params.from,
        to: params.to,
    };
    Ok(page(state.db.delivery_orders().list(&filter).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<DeliveryOrderDetail>> {
    Ok(ok(state.db.delivery_orders().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<DeliveryOrderInput>,
) -> ApiResult<(StatusCode, JsonResponse<DeliveryOrderDetail>)> {
    auth.require(DISTRIBUTION)?;
    Ok(created(
        state
            .db
            .delivery_orders()
            .create(&input, Some(auth.id()))
            .await?,
    ))
}

async fn dispatch(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Dispatch>> {
    auth.require(DISTRIBUTION)?;
    let (delivery_order, movements) = state
        .db
        .delivery_orders()
        .dispatch(&id, Some(auth.id()))
        .await?;
    Ok(ok(Dispatch {
        delivery_order,
        movements,
    }))
}

async fn deliver(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ConfirmDelivery>,
) -> ApiResult<JsonResponse<DeliveryOrder>> {
    auth.require(DELIVERY_CONFIRMATION)?;
    Ok(ok(state.db.delivery_orders().deliver(&id, &input).await?))
}

async fn cancel(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<DeliveryOrder>> {
    auth.require(DISTRIBUTION)?;
    Ok(ok(state.db.delivery_orders().cancel(&id).await?))
}
