//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (business rule)         │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (mbg-api) ← Status code + JSON envelope                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use mbg_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// `fields` are the camelCase names of the columns in the violated
    /// constraint, e.g. `["itemId", "locationId", "batchNumber"]`.
    #[error("Duplicate value for {}", fields.join(", "))]
    UniqueViolation { fields: Vec<String> },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent item / location / supplier
    /// - Deleting a row that other rows still reference
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule rejected the operation inside a transaction.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error for the given camelCase fields.
    pub fn duplicate<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DbError::UniqueViolation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Extracts the camelCase column names from a SQLite unique violation.
///
/// ```text
/// "UNIQUE constraint failed: stocks.item_id, stocks.location_id, stocks.batch_number"
///      → ["itemId", "locationId", "batchNumber"]
/// ```
pub fn unique_fields(message: &str) -> Vec<String> {
    let Some(columns) = message.split("UNIQUE constraint failed: ").nth(1) else {
        return Vec::new();
    };

    columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|qualified| {
            let column = qualified.rsplit('.').next().unwrap_or(qualified);
            to_camel_case(column)
        })
        .collect()
}

fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>, ..."
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    DbError::UniqueViolation {
                        fields: unique_fields(msg),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<mbg_core::ValidationError> for DbError {
    fn from(err: mbg_core::ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_fields_single_column() {
        assert_eq!(
            unique_fields("UNIQUE constraint failed: items.sku"),
            vec!["sku".to_string()]
        );
    }

    #[test]
    fn test_unique_fields_composite() {
        assert_eq!(
            unique_fields(
                "UNIQUE constraint failed: stocks.item_id, stocks.location_id, stocks.batch_number"
            ),
            vec!["itemId", "locationId", "batchNumber"]
        );
    }

    #[test]
    fn test_unique_fields_unrecognised_message() {
        assert!(unique_fields("something else").is_empty());
    }

    #[test]
    fn test_duplicate_message() {
        let err = DbError::duplicate(["poNumber"]);
        assert_eq!(err.to_string(), "Duplicate value for poNumber");
    }
}
