//! Schools, health posts and other receiving points.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::BeneficiaryInput;
use mbg_core::{Beneficiary, BeneficiaryType};
use mbg_db::ListQuery;
use serde::Deserialize;

use super::DISTRIBUTION;
use crate::error::ApiResult;
use crate::extract::{page_request, ApiJson, ApiQuery, AuthUser};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/beneficiaries", get(list).post(create))
        .route("/api/beneficiaries/{id}", get(get_one).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct BeneficiaryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub beneficiary_type: Option<BeneficiaryType>,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<BeneficiaryParams>,
) -> ApiResult<JsonResponse<Vec<Beneficiary>>> {
    let query = ListQuery::new(page_request(params.page, params.limit), params.search);
    Ok(page(state.db.beneficiaries().list(&query, params.beneficiary_type).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Beneficiary>> {
    Ok(ok(state.db.beneficiaries().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<BeneficiaryInput>,
) -> ApiResult<(StatusCode, JsonResponse<Beneficiary>)> {
    auth.require(DISTRIBUTION)?;
    Ok(created(state.db.beneficiaries().create(&input).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BeneficiaryInput>,
) -> ApiResult<JsonResponse<Beneficiary>> {
    auth.require(DISTRIBUTION)?;
    Ok(ok(state.db.beneficiaries().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(DISTRIBUTION)?;
    state.db.beneficiaries().delete(&id).await?;
    Ok(message("Beneficiary deleted"))
}
