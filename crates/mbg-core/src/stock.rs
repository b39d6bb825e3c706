//! # Stock Arithmetic
//!
//! Pure calculations over stock rows. The database layer loads rows, calls
//! into this module to decide what to change, then writes the result.
//!
//! ## Quantities on a Stock Row
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ quantity (on hand)                                       │
//! │ ┌───────────────────────┬──────────────────────────────┐ │
//! │ │ reserved_quantity     │ available                    │ │
//! │ │ (held by WO / DO)     │ = quantity - reserved        │ │
//! │ └───────────────────────┴──────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//!
//! Invariant after every committed change: 0 <= reserved <= quantity
//! ```
//!
//! ## FEFO Allocation
//! Requests spanning several batches draw from the earliest expiry first.
//! Rows without an expiry date come last, ties fall back to the oldest row.

use serde::Serialize;
use std::cmp::Ordering;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Stock;
use crate::QUANTITY_EPSILON;

// =============================================================================
// Availability
// =============================================================================

/// Quantity not held by any reservation.
#[inline]
pub fn available(quantity: f64, reserved: f64) -> f64 {
    quantity - reserved
}

/// Whether `requested` fits into `available`, allowing float slack.
#[inline]
pub fn covers(available: f64, requested: f64) -> bool {
    requested <= available + QUANTITY_EPSILON
}

/// Snaps values within epsilon of zero to exactly zero.
///
/// Keeps accumulated float error from leaving rows at `1e-15` reserved.
#[inline]
pub fn snap(value: f64) -> f64 {
    if value.abs() < QUANTITY_EPSILON {
        0.0
    } else {
        value
    }
}

/// Checks the row invariant `0 <= reserved <= quantity`.
pub fn check_row(stock_id: &str, quantity: f64, reserved: f64) -> CoreResult<()> {
    if reserved < -QUANTITY_EPSILON || quantity + QUANTITY_EPSILON < reserved {
        return Err(CoreError::BelowReserved {
            stock_id: stock_id.to_string(),
            reserved,
        });
    }
    Ok(())
}

/// Applies a signed adjustment to a row and returns the new quantity.
///
/// Fails when the result would drop below what is reserved (or below zero).
pub fn apply_delta(stock: &Stock, delta: f64) -> CoreResult<f64> {
    let quantity = snap(stock.quantity + delta);
    if quantity < -QUANTITY_EPSILON || quantity + QUANTITY_EPSILON < stock.reserved_quantity {
        return Err(CoreError::BelowReserved {
            stock_id: stock.id.clone(),
            reserved: stock.reserved_quantity,
        });
    }
    Ok(quantity.max(0.0))
}

// =============================================================================
// FEFO Allocation
// =============================================================================

/// Part of a request satisfied from one stock row.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub stock_id: String,
    pub batch_number: String,
    pub expiry_date: Option<chrono::NaiveDate>,
    pub quantity: f64,
}

/// FEFO ordering: earliest expiry first, no expiry last, then oldest row.
pub fn fefo_order(a: &Stock, b: &Stock) -> Ordering {
    match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.created_at.cmp(&b.created_at))
    .then_with(|| a.id.cmp(&b.id))
}

/// Plans how to draw `requested` units of one item from `rows`.
///
/// `rows` must all belong to the same item and location; `item` is only used
/// in the error. Only the available part of each row is considered.
///
/// ## Errors
/// `InsufficientStock` when the rows' combined availability is short.
/// Nothing is allocated in that case.
pub fn allocate_fefo(rows: &[Stock], item: &str, requested: f64) -> CoreResult<Vec<Allocation>> {
    let total: f64 = rows.iter().map(|s| s.available().max(0.0)).sum();
    if !covers(total, requested) {
        return Err(CoreError::InsufficientStock {
            item: item.to_string(),
            available: total,
            requested,
        });
    }

    let mut ordered: Vec<&Stock> = rows.iter().collect();
    ordered.sort_by(|a, b| fefo_order(a, b));

    let mut remaining = requested;
    let mut plan = Vec::new();
    for stock in ordered {
        if remaining <= QUANTITY_EPSILON {
            break;
        }
        let free = stock.available();
        if free <= QUANTITY_EPSILON {
            continue;
        }
        let take = free.min(remaining);
        plan.push(Allocation {
            stock_id: stock.id.clone(),
            batch_number: stock.batch_number.clone(),
            expiry_date: stock.expiry_date,
            quantity: take,
        });
        remaining -= take;
    }

    Ok(plan)
}

// =============================================================================
// Summaries
// =============================================================================

/// Totals for one item, optionally within one location.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockSummary {
    pub item_id: String,
    pub sku: String,
    pub item_name: String,
    pub unit: String,
    pub location_id: Option<String>,
    pub total_quantity: f64,
    pub reserved_quantity: f64,
    pub available_quantity: f64,
    pub reorder_point: f64,
    pub below_reorder_point: bool,
}

impl StockSummary {
    /// Builds a summary from raw totals.
    pub fn new(
        item: &crate::types::Item,
        location_id: Option<String>,
        total_quantity: f64,
        reserved_quantity: f64,
    ) -> Self {
        let available_quantity = available(total_quantity, reserved_quantity);
        StockSummary {
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            item_name: item.name.clone(),
            unit: item.unit.clone(),
            location_id,
            total_quantity,
            reserved_quantity,
            available_quantity,
            reorder_point: item.reorder_point,
            below_reorder_point: is_below_reorder_point(available_quantity, item.reorder_point),
        }
    }
}

/// Low stock: available strictly below a positive reorder point.
///
/// A reorder point of zero disables the alert.
#[inline]
pub fn is_below_reorder_point(available: f64, reorder_point: f64) -> bool {
    reorder_point > 0.0 && available < reorder_point
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    fn row(id: &str, quantity: f64, reserved: f64, expiry: Option<NaiveDate>, age_secs: i64) -> Stock {
        let created = Utc::now() - Duration::seconds(age_secs);
        Stock {
            id: id.to_string(),
            item_id: "rice".to_string(),
            location_id: "kitchen".to_string(),
            quantity,
            reserved_quantity: reserved,
            batch_number: id.to_string(),
            expiry_date: expiry,
            created_at: created,
            updated_at: created,
        }
    }

    fn date(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 3, d)
    }

    #[test]
    fn test_available() {
        assert_eq!(available(10.0, 4.0), 6.0);
        assert_eq!(row("a", 5.0, 5.0, None, 0).available(), 0.0);
    }

    #[test]
    fn test_fefo_prefers_earliest_expiry() {
        let rows = vec![
            row("late", 10.0, 0.0, date(20), 100),
            row("none", 10.0, 0.0, None, 200),
            row("early", 10.0, 0.0, date(5), 0),
        ];

        let plan = allocate_fefo(&rows, "RICE", 15.0).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].stock_id, "early");
        assert_eq!(plan[0].quantity, 10.0);
        assert_eq!(plan[1].stock_id, "late");
        assert_eq!(plan[1].quantity, 5.0);
    }

    #[test]
    fn test_fefo_skips_reserved_part() {
        let rows = vec![
            row("a", 10.0, 8.0, date(1), 0),
            row("b", 10.0, 0.0, date(2), 0),
        ];

        let plan = allocate_fefo(&rows, "RICE", 5.0).unwrap();
        assert_eq!(plan[0].stock_id, "a");
        assert_eq!(plan[0].quantity, 2.0);
        assert_eq!(plan[1].quantity, 3.0);
    }

    #[test]
    fn test_fefo_ties_use_oldest_row() {
        let rows = vec![row("young", 4.0, 0.0, None, 0), row("old", 4.0, 0.0, None, 60)];
        let plan = allocate_fefo(&rows, "RICE", 1.0).unwrap();
        assert_eq!(plan[0].stock_id, "old");
    }

    #[test]
    fn test_insufficient_stock() {
        let rows = vec![row("a", 10.0, 2.5, None, 0)];
        let err = allocate_fefo(&rows, "RICE-001", 20.0).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => {
                assert_eq!(item, "RICE-001");
                assert_eq!(available, 7.5);
                assert_eq!(requested, 20.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exact_fit_with_float_noise() {
        // 0.1 + 0.2 style error must not cause a spurious shortage.
        let rows = vec![row("a", 0.1, 0.0, None, 0), row("b", 0.2, 0.0, None, 0)];
        assert!(allocate_fefo(&rows, "SALT", 0.3).is_ok());
    }

    #[test]
    fn test_apply_delta_respects_reserved() {
        let stock = row("a", 10.0, 4.0, None, 0);
        assert_eq!(apply_delta(&stock, -6.0).unwrap(), 4.0);
        assert_eq!(apply_delta(&stock, 5.0).unwrap(), 15.0);
        assert!(matches!(
            apply_delta(&stock, -6.5),
            Err(CoreError::BelowReserved { .. })
        ));
    }

    #[test]
    fn test_check_row() {
        assert!(check_row("a", 10.0, 10.0).is_ok());
        assert!(check_row("a", 10.0, 0.0).is_ok());
        assert!(check_row("a", 10.0, 10.5).is_err());
        assert!(check_row("a", 10.0, -1.0).is_err());
    }

    #[test]
    fn test_below_reorder_point() {
        assert!(is_below_reorder_point(4.0, 5.0));
        assert!(!is_below_reorder_point(5.0, 5.0));
        assert!(!is_below_reorder_point(0.0, 0.0));
    }
}
