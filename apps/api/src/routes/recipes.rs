//! Recipes and ingredient scaling.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use mbg_core::input::RecipeInput;
use mbg_core::recipe::ScaledRecipe;
use mbg_core::{Recipe, RecipeDetail};
use serde::Deserialize;

use super::KITCHEN;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser, ListParams};
use crate::response::{created, message, ok, page, JsonResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/recipes", get(list).post(create))
        .route("/api/recipes/{id}", get(get_one).put(update).delete(remove))
        .route("/api/recipes/{id}/scale", get(scale))
}

/// `?quantity=` target output, in the recipe's portion unit.
#[derive(Debug, Deserialize)]
pub struct ScaleParams {
    pub quantity: f64,
}

async fn list(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<JsonResponse<Vec<Recipe>>> {
    Ok(page(state.db.recipes().list(&params.query()).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<RecipeDetail>> {
    Ok(ok(state.db.recipes().get(&id).await?))
}

async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<RecipeInput>,
) -> ApiResult<(StatusCode, JsonResponse<RecipeDetail>)> {
    auth.require(KITCHEN)?;
    Ok(created(state.db.recipes().create(&input).await?))
}

async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<RecipeInput>,
) -> ApiResult<JsonResponse<RecipeDetail>> {
    auth.require(KITCHEN)?;
    Ok(ok(state.db.recipes().update(&id, &input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<JsonResponse<Option<()>>> {
    auth.require(KITCHEN)?;
    state.db.recipes().delete(&id).await?;
    Ok(message("Recipe deleted"))
}

async fn scale(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<ScaleParams>,
) -> ApiResult<JsonResponse<ScaledRecipe>> {
    mbg_core::validation::validate_positive("quantity", params.quantity)?;
    Ok(ok(state.db.recipes().scale(&id, params.quantity).await?))
}
