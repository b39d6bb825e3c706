//! # Validation Module
//!
//! Field-level validators shared by every request type in [`crate::input`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: JSON deserialization (axum Json extractor)                   │
//! │  ├── Shape and types                                                   │
//! │  └── Unknown enum values                                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called from `input::*::validate`)               │
//! │  ├── Required fields, lengths, formats                                 │
//! │  └── Positive quantities, non-negative prices                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE constraints  → 409                                         │
//! │  ├── Foreign keys        → 409                                         │
//! │  └── CHECK constraints                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mbg_core::validation::{validate_code, validate_positive};
//!
//! validate_code("sku", "RICE-001").unwrap();
//! validate_positive("quantity", 2.5).unwrap();
//! ```

use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business identifier (sku, code).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use mbg_core::validation::validate_code;
///
/// assert!(validate_code("sku", "RICE-001").is_ok());
/// assert!(validate_code("sku", "").is_err());
/// assert!(validate_code("sku", "has space").is_err());
/// ```
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (1..=200 characters after trimming).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Checks a non-empty string field.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an email address.
///
/// Only the basic shape is checked: one `@`, a non-empty local part and a
/// dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validates a new password (8..=128 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, or `None` when empty.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let query = match query.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(q) => q,
    };

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Largest quantity accepted anywhere (kg, litres, portions).
pub const MAX_QUANTITY: f64 = 1_000_000_000.0;

/// Largest unit price accepted, in minor units.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Longest shelf life an item may declare, and the widest expiry window.
pub const MAX_DAYS: i64 = 36_500;

fn quantity_out_of_range(field: &str, min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max: MAX_QUANTITY as i64,
    }
}

/// Quantity must be finite, strictly positive and at most [`MAX_QUANTITY`].
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if value > MAX_QUANTITY {
        return Err(quantity_out_of_range(field, 0));
    }
    Ok(())
}

/// Value must be finite, zero or more and at most [`MAX_QUANTITY`].
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if value > MAX_QUANTITY {
        return Err(quantity_out_of_range(field, 0));
    }
    Ok(())
}

/// Day counts (shelf life, expiry window): `1..=MAX_DAYS`.
pub fn validate_days(field: &str, days: i64) -> ValidationResult<()> {
    if days <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if days > MAX_DAYS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_DAYS,
        });
    }
    Ok(())
}

/// Validates a price in minor units. Zero is allowed (donated goods).
///
/// ## Example
/// ```rust
/// use mbg_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("priceCents", 1_250_000).is_ok());
/// assert!(validate_price_cents("priceCents", 0).is_ok());
/// assert!(validate_price_cents("priceCents", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// A signed adjustment must be finite and non-zero.
pub fn validate_delta(field: &str, delta: f64) -> ValidationResult<()> {
    if !delta.is_finite() || delta == 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a non-zero number".to_string(),
        });
    }
    if delta.abs() > MAX_QUANTITY {
        return Err(quantity_out_of_range(field, -(MAX_QUANTITY as i64)));
    }
    Ok(())
}

/// `date + days`, for a day count that came from user input.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use mbg_core::validation::add_days;
///
/// let scheduled = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
/// assert_eq!(add_days("shelfLifeDays", scheduled, 2).unwrap().to_string(), "2026-03-03");
/// assert!(add_days("days", scheduled, 100_000_000).is_err());
/// ```
pub fn add_days(field: &str, date: NaiveDate, days: i64) -> ValidationResult<NaiveDate> {
    let out_of_range = || ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_DAYS,
    };
    if !(0..=MAX_DAYS).contains(&days) {
        return Err(out_of_range());
    }
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Document lines: at least one, and no item listed twice.
pub fn validate_lines<'a>(
    field: &str,
    item_ids: impl IntoIterator<Item = &'a str>,
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for id in item_ids {
        validate_required(&format!("{field}.itemId"), id)?;
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateLine {
                field: field.to_string(),
                item_id: id.to_string(),
            });
        }
    }
    if seen.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("sku", "RICE-001").is_ok());
        assert!(validate_code("code", "kit_01").is_ok());

        assert!(validate_code("sku", "").is_err());
        assert!(validate_code("sku", "   ").is_err());
        assert!(validate_code("sku", "has space").is_err());
        assert!(validate_code("sku", &"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Beras Premium 5kg").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@mbg.local").is_ok());
        assert!(validate_email("a.b+c@example.co.id").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query(None).unwrap(), None);
        assert_eq!(validate_search_query(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_search_query(Some(" rice ")).unwrap(),
            Some("rice".to_string())
        );
        assert!(validate_search_query(Some(&"x".repeat(101))).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_positive("quantity", 0.5).is_ok());
        assert!(validate_positive("quantity", 0.0).is_err());
        assert!(validate_positive("quantity", f64::NAN).is_err());

        assert!(validate_non_negative("reorderPoint", 0.0).is_ok());
        assert!(validate_non_negative("reorderPoint", -0.1).is_err());

        assert!(validate_delta("delta", -3.0).is_ok());
        assert!(validate_delta("delta", 0.0).is_err());
    }

    #[test]
    fn test_numeric_upper_bounds() {
        assert!(validate_positive("quantity", MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_positive("quantity", 1e300),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_non_negative("reorderPoint", 2e9).is_err());
        assert!(validate_delta("delta", -2e9).is_err());

        assert!(validate_price_cents("priceCents", MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price_cents("priceCents", i64::MAX),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert!(validate_days("days", 7).is_ok());
        assert!(validate_days("days", 0).is_err());
        assert!(matches!(
            validate_days("days", 100_000_000),
            Err(ValidationError::OutOfRange { max: MAX_DAYS, .. })
        ));
    }

    #[test]
    fn test_add_days() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(add_days("days", start, 0).unwrap(), start);
        assert_eq!(
            add_days("days", start, 7).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
        );
        assert!(add_days("days", start, -1).is_err());
        assert!(matches!(
            add_days("days", start, 100_000_000),
            Err(ValidationError::OutOfRange { field, .. }) if field == "days"
        ));
        assert!(add_days("days", NaiveDate::MAX, 1).is_err());
    }

    #[test]
    fn test_validate_lines() {
        assert!(validate_lines("items", ["a", "b"]).is_ok());
        assert!(matches!(
            validate_lines("items", Vec::<&str>::new()),
            Err(ValidationError::Empty { .. })
        ));
        assert!(matches!(
            validate_lines("items", ["a", "a"]),
            Err(ValidationError::DuplicateLine { .. })
        ));
        assert!(validate_lines("items", [""]).is_err());
    }
}
