//! # Error Types
//!
//! Domain-specific error types for mbg-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mbg-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mbg-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  mbg-api errors (in app)                                               │
//! │  └── ApiError         - What the HTTP client sees (JSON envelope)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, document number, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough available (unreserved) stock to satisfy a request.
    ///
    /// ## When This Occurs
    /// - Starting a work order whose scaled ingredients exceed kitchen stock
    /// - Creating a delivery order for more portions than the source holds
    /// - Transferring or adjusting below the reserved quantity
    ///
    /// ## User Workflow
    /// ```text
    /// Start work order WO-20260301-0001 (250 portions)
    ///      │
    ///      ▼
    /// Rice needed: 20.0 kg, available at kitchen: 12.5 kg
    ///      │
    ///      ▼
    /// InsufficientStock { item: "RICE-001", available: 12.5, requested: 20.0 }
    ///      │
    ///      ▼
    /// HTTP 422: "Insufficient stock for RICE-001: available 12.5, requested 20"
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: f64,
        requested: f64,
    },

    /// A stock change would leave a row with reserved > quantity or
    /// quantity < 0.
    #[error("Stock {stock_id} cannot go below its reserved quantity ({reserved})")]
    BelowReserved { stock_id: String, reserved: f64 },

    /// Document is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Completing a work order that was never started
    /// - Dispatching a cancelled delivery order
    /// - Receiving goods against a draft purchase order
    #[error("{entity} {number} is {from}, cannot move to {to}")]
    InvalidStatusTransition {
        entity: String,
        number: String,
        from: String,
        to: String,
    },

    /// Document has left the state in which it may be edited or deleted.
    #[error("{entity} {number} is {status} and can no longer be changed")]
    Locked {
        entity: String,
        number: String,
        status: String,
    },

    /// Recipe portion size is zero or negative, so scaling is undefined.
    #[error("Recipe portion size must be greater than zero (got {0})")]
    InvalidPortionSize(f64),

    /// Goods receipt line exceeds the outstanding quantity of its PO line.
    #[error("Receipt for {item} exceeds outstanding quantity: outstanding {outstanding}, received {received}")]
    OverReceipt {
        item: String,
        outstanding: f64,
        received: f64,
    },

    /// Item has the wrong type for the role it is used in
    /// (e.g. a raw material as a recipe output).
    #[error("Item {item} must be a {expected}")]
    ItemTypeMismatch { item: String, expected: String },

    /// A money amount left the range of whole cents an `i64` can hold.
    ///
    /// ## When This Occurs
    /// - Scaling a recipe to an enormous target quantity
    /// - A purchase order whose line totals sum past the limit
    #[error("Amount for {context} exceeds the supported range")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an AmountOverflow error for the given document or line.
    pub fn overflow(context: impl Into<String>) -> Self {
        CoreError::AmountOverflow {
            context: context.into(),
        }
    }

    /// Creates an InvalidStatusTransition error from displayable statuses.
    pub fn transition(
        entity: impl Into<String>,
        number: impl Into<String>,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        CoreError::InvalidStatusTransition {
            entity: entity.into(),
            number: number.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A document needs at least one line.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Same item listed twice in one document.
    #[error("{field} lists item {item_id} more than once")]
    DuplicateLine { field: String, item_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item: "RICE-001".to_string(),
            available: 12.5,
            requested: 20.0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for RICE-001: available 12.5, requested 20"
        );
    }

    #[test]
    fn test_transition_message() {
        let err = CoreError::transition("Work order", "WO-1", "PLANNED", "COMPLETED");
        assert_eq!(
            err.to_string(),
            "Work order WO-1 is PLANNED, cannot move to COMPLETED"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must contain at least one entry");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
