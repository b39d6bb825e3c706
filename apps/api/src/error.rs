//! Error types for the API.
//!
//! Every failure a handler can produce is converted into [`ApiError`],
//! which renders the error envelope:
//!
//! ```text
//! { "success": false, "message": "...", "code": "...", "fields"?: [...], "stack"?: "..." }
//! ```
//!
//! ## Status Mapping
//! ```text
//! ValidationError, bad JSON / query         → 400
//! missing / invalid / expired token         → 401
//! not approved, inactive, wrong role        → 403
//! DbError::NotFound                         → 404
//! DbError::UniqueViolation / ForeignKey     → 409
//! CoreError business rule                   → 422
//! anything else                             → 500 (stack in development)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mbg_core::{CoreError, ValidationError};
use mbg_db::DbError;
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;

/// Whether 500 responses carry the error's debug chain.
static EXPOSE_DETAIL: AtomicBool = AtomicBool::new(false);

/// Enables `stack` on internal errors (development only).
pub fn expose_error_detail(enabled: bool) {
    EXPOSE_DETAIL.store(enabled, Ordering::Relaxed);
}

/// API error: status code plus the envelope fields.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub fields: Vec<String>,
    /// Debug chain of an unclassified error.
    pub detail: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            fields: Vec::new(),
            detail: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(detail: impl std::fmt::Debug) -> Self {
        let detail = format!("{detail:?}");
        error!(detail = %detail, "Unhandled error");
        ApiError {
            detail: Some(detail),
            ..ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
        }
    }

    fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let stack = if EXPOSE_DETAIL.load(Ordering::Relaxed) {
            self.detail.as_deref()
        } else {
            None
        };
        let body = ErrorBody {
            success: false,
            message: &self.message,
            code: self.code,
            fields: (!self.fields.is_empty()).then_some(self.fields.as_slice()),
            stack,
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status.as_u16(), self.code, self.message)
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// The field a validation error is about.
fn validation_field(err: &ValidationError) -> &str {
    match err {
        ValidationError::Required { field }
        | ValidationError::TooShort { field, .. }
        | ValidationError::TooLong { field, .. }
        | ValidationError::OutOfRange { field, .. }
        | ValidationError::MustBePositive { field }
        | ValidationError::Negative { field }
        | ValidationError::InvalidFormat { field, .. }
        | ValidationError::Empty { field }
        | ValidationError::DuplicateLine { field, .. } => field,
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let field = validation_field(&err).to_string();
        ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
            .with_fields(vec![field])
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::BelowReserved { .. } => "BELOW_RESERVED",
            CoreError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            CoreError::Locked { .. } => "DOCUMENT_LOCKED",
            CoreError::InvalidPortionSize(_) => "INVALID_PORTION_SIZE",
            CoreError::OverReceipt { .. } => "OVER_RECEIPT",
            CoreError::ItemTypeMismatch { .. } => "ITEM_TYPE_MISMATCH",
            CoreError::AmountOverflow { .. } => "AMOUNT_OUT_OF_RANGE",
        };

        match err {
            CoreError::Validation(inner) => inner.into(),
            other => {
                warn!(code, error = %other, "Business rule rejected request");
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, code, other.to_string())
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => {
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{entity} not found"))
            }
            DbError::UniqueViolation { fields } => {
                let message = if fields.is_empty() {
                    "Duplicate value".to_string()
                } else {
                    format!("Duplicate value for {}", fields.join(", "))
                };
                ApiError::new(StatusCode::CONFLICT, "DUPLICATE", message).with_fields(fields)
            }
            DbError::ForeignKeyViolation { message } => ApiError {
                detail: Some(message),
                ..ApiError::new(
                    StatusCode::CONFLICT,
                    "FOREIGN_KEY_VIOLATION",
                    "Referenced record does not exist or the record is still in use",
                )
            },
            DbError::Core(core) => core.into(),
            other => ApiError::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if matches!(err, AuthError::Signing(_) | AuthError::Hashing(_)) {
            return ApiError::internal(err);
        }
        let (status, code) = match &err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::WrongTokenType { .. }
            | AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            AuthError::NotApproved
            | AuthError::Inactive
            | AuthError::Forbidden { .. }
            | AuthError::Signing(_)
            | AuthError::Hashing(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), "BAD_REQUEST", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
