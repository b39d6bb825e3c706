//! Dashboard and reports. Read-only, open to every signed-in user.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use mbg_core::stock::StockSummary;
use mbg_db::{
    DashboardSummary, DistributionReport, ExpiringStock, ProductionReport, EXPIRY_WARNING_DAYS,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiQuery, AuthUser};
use crate::response::{ok, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/reporting/dashboard", get(dashboard))
        .route("/api/reporting/low-stock", get(low_stock))
        .route("/api/reporting/expiring", get(expiring))
        .route("/api/reporting/production", get(production))
        .route("/api/reporting/distribution", get(distribution))
}

#[derive(Debug, Deserialize)]
pub struct ExpiringParams {
    pub days: Option<i64>,
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both inclusive and optional.
#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    fn check(&self) -> Result<(), ApiError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(ApiError::bad_request("from must not be after to"))
            }
            _ => Ok(()),
        }
    }
}

async fn dashboard(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> ApiResult<JsonResponse<DashboardSummary>> {
    Ok(ok(state.db.reporting().dashboard().await?))
}

async fn low_stock(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> ApiResult<JsonResponse<Vec<StockSummary>>> {
    Ok(ok(state.db.reporting().low_stock().await?))
}

async fn expiring(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<ExpiringParams>,
) -> ApiResult<JsonResponse<Vec<ExpiringStock>>> {
    let days = params.days.unwrap_or(EXPIRY_WARNING_DAYS);
    if days < 0 {
        return Err(ApiError::bad_request("days must not be negative"));
    }
    Ok(ok(state.db.reporting().expiring(days).await?))
}

async fn production(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<JsonResponse<Vec<ProductionReport>>> {
    range.check()?;
    Ok(ok(state.db.reporting().production(range.from, range.to).await?))
}

async fn distribution(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<JsonResponse<Vec<DistributionReport>>> {
    range.check()?;
    Ok(ok(state.db.reporting().distribution(range.from, range.to).await?))
}
