//! Success envelope.
//!
//! ```text
//! { "success": true, "data": ..., "pagination"?: { page, limit, total, totalPages } }
//! ```

use axum::http::StatusCode;
use axum::Json;
use mbg_core::{Page, Pagination};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type JsonResponse<T> = Json<ApiResponse<T>>;

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> JsonResponse<T> {
    Json(ApiResponse {
        success: true,
        data,
        pagination: None,
        message: None,
    })
}

/// 201 with the created resource.
pub fn created<T: Serialize>(data: T) -> (StatusCode, JsonResponse<T>) {
    (StatusCode::CREATED, ok(data))
}

/// 200 with a page of rows and its pagination block.
pub fn page<T: Serialize>(page: Page<T>) -> JsonResponse<Vec<T>> {
    Json(ApiResponse {
        success: true,
        data: page.items,
        pagination: Some(page.pagination),
        message: None,
    })
}

/// 200 with a message and no data (deletes).
pub fn message(text: impl Into<String>) -> JsonResponse<Option<()>> {
    Json(ApiResponse {
        success: true,
        data: None,
        pagination: None,
        message: Some(text.into()),
    })
}
