//! Production work orders.
//!
//! ```text
//! POST /api/work-orders              PLANNED       (cost estimated)
//! POST /api/work-orders/{id}/start   IN_PROGRESS   (ingredients reserved, FEFO)
//! POST /api/work-orders/{id}/complete COMPLETED    (ingredients consumed, output credited)
//! POST /api/work-orders/{id}/cancel  CANCELLED     (reservations released)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use mbg_core::input::{CompleteWorkOrder, WorkOrderInput};
use mbg_core::{StockMovement, WorkOrder, WorkOrderDetail, WorkOrderStatus};
use mbg_db::WorkOrderFilter;
use serde::{Deserialize, Serialize};

use super::KITCHEN;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/work-orders", get(list).post(create))
        .route("/api/work-orders/{id}", get(get_one))
        .route("/api/work-orders/{id}/start", post(start))
        .route("/api/work-orders/{id}/complete", post(complete))
        .route("/api/work-orders/{id}/cancel", post(cancel))
}

/// `?search=&status=&kitchenLocationId=&from=&to=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub kitchen_location_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub work_order: WorkOrder,
    pub movements: Vec<StockMovement>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<WorkOrderParams>,
) -> ApiResult<JsonResponse<Vec<WorkOrder>>> {
    let filter = WorkOrderFilter {
        page: page_request(params.page, params.limit),
        search: params.search,
        status: params.status,
        kitchen_location_id: params.kitchen_location_id,
        from: params.from,
        to: params.to,
    };
    Ok(page(state.db.work_orders().list(&filter).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<WorkOrderDetail>> {
    Ok(ok(state.db.work_orders().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<WorkOrderInput>,
) -> ApiResult<(StatusCode, JsonResponse<WorkOrderDetail>)> {
    auth.require(KITCHEN)?;
    Ok(created(
        state.db.work_orders().create(&input, Some(auth.id())).await?,
    ))
}

async fn start(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<WorkOrder>> {
    auth.require(KITCHEN)?;
    Ok(ok(state.db.work_orders().start(&id).await?))
}

/// The body is optional; without one the planned quantity is produced.
async fn complete(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<CompleteWorkOrder>>,
) -> ApiResult<JsonResponse<Completion>> {
    auth.require(KITCHEN)?;
    let input = body.map(|Json(input)| input).unwrap_or_default();
    let (work_order, movements) = state
        .db
        .work_orders()
        .complete(&id, &input, Some(auth.id()))
        .await?;
    Ok(ok(Completion {
        work_order,
        movements,
    }))
}

async fn cancel(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<WorkOrder>> {
    auth.require(KITCHEN)?;
    Ok(ok(state.db.work_orders().cancel(&id).await?))
}
