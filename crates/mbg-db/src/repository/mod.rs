//! # Repository Module
//!
//! Database repository implementations for the MBG inventory system.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │  db.work_orders().start(&id, user)                             │
//! │       ▼                                                                 │
//! │  WorkOrderRepository ─────────────┐                                    │
//! │       │                           │ same transaction                   │
//! │       ▼                           ▼                                    │
//! │  sequence::next_number    stock::reserve / consume / credit            │
//! │       │                           │                                    │
//! │       └─────────────┬─────────────┘                                    │
//! │                     ▼                                                   │
//! │                SQLite Database                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Master data repositories (category, location, item, supplier,
//! beneficiary, user) are plain CRUD over the pool. Document repositories
//! (purchase order, goods receipt, work order, delivery order) run every
//! state change inside one transaction opened by [`begin_posting`], and
//! touch stock only through the ledger functions in [`stock`].

pub mod beneficiary;
pub mod category;
pub mod delivery_order;
pub mod goods_receipt;
pub mod item;
pub mod location;
pub mod purchase_order;
pub mod recipe;
pub mod reporting;
pub mod sequence;
pub mod stock;
pub mod supplier;
pub mod user;
pub mod work_order;

use mbg_core::PageRequest;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Listing
// =============================================================================

/// Paging plus free-text search, shared by every list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: PageRequest,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(page: PageRequest, search: Option<String>) -> Self {
        ListQuery { page, search }
    }

    /// `%term%` for LIKE, or `None` when no search was given.
    pub(crate) fn pattern(&self) -> Option<String> {
        like_pattern(self.search.as_deref())
    }
}

/// Builds a case-insensitive substring pattern for `LIKE`.
///
/// SQLite's LIKE is already case-insensitive for ASCII. `%` and `_` typed
/// by the user are matched literally via `ESCAPE '\'`.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

// =============================================================================
// Helpers
// =============================================================================

/// Generates a new entity ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Opens a transaction that already holds SQLite's write lock.
///
/// `BEGIN` is deferred, so the first statement run here is a write. Two
/// postings that both read stock then write it can therefore never
/// interleave: the second waits (up to the busy timeout) until the first
/// commits or rolls back.
pub(crate) async fn begin_posting(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE document_sequences SET last_value = last_value WHERE prefix = ''")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Fails with `NotFound` unless `table` has a row with this id.
pub(crate) async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)");
    let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;
    if exists {
        Ok(())
    } else {
        Err(DbError::not_found(entity, id))
    }
}

/// Maps zero affected rows to `NotFound`.
pub(crate) fn expect_one(rows_affected: u64, entity: &'static str, id: &str) -> DbResult<()> {
    if rows_affected == 0 {
        Err(DbError::not_found(entity, id))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use chrono::NaiveDate;
    use mbg_core::input::*;
    use mbg_core::*;

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn location(db: &Database, code: &str, location_type: LocationType) -> Location {
        db.locations()
            .create(&LocationInput {
                code: code.to_string(),
                name: format!("{code} name"),
                location_type,
                address: None,
                capacity_kg: None,
                is_active: true,
            })
            .await
            .unwrap()
    }

    pub async fn item(db: &Database, sku: &str, item_type: ItemType, price_cents: i64) -> Item {
        db.items()
            .create(&ItemInput {
                sku: sku.to_string(),
                code: sku.to_string(),
                name: format!("{sku} name"),
                description: None,
                item_type,
                unit: "kg".to_string(),
                category_id: None,
                reorder_point: 5.0,
                price_cents,
                shelf_life_days: Some(2),
                is_active: true,
            })
            .await
            .unwrap()
    }

    pub async fn stock(
        db: &Database,
        item: &Item,
        location: &Location,
        quantity: f64,
        batch: &str,
        expiry: Option<NaiveDate>,
    ) -> Stock {
        db.stock()
            .create(
                &NewStock {
                    item_id: item.id.clone(),
                    location_id: location.id.clone(),
                    quantity,
                    batch_number: batch.to_string(),
                    expiry_date: expiry,
                },
                None,
            )
            .await
            .unwrap()
            .stock
    }

    pub async fn supplier(db: &Database) -> Supplier {
        db.suppliers()
            .create(&SupplierInput {
                code: "SUP-01".to_string(),
                name: "Tani Makmur".to_string(),
                contact_name: None,
                phone: None,
                email: None,
                address: None,
                is_active: true,
            })
            .await
            .unwrap()
    }

    /// MEAL from RICE (8 kg) and CHICKEN (6 kg) per 100 portions.
    pub async fn nasi_ayam(db: &Database) -> RecipeInput {
        let meal = item(db, "MEAL", ItemType::FinishedGood, 0).await;
        let rice = item(db, "RICE", ItemType::RawMaterial, 1_200).await;
        let chicken = item(db, "CHICKEN", ItemType::RawMaterial, 3_500).await;
        RecipeInput {
            code: "NASI-AYAM".to_string(),
            name: "Nasi Ayam".to_string(),
            output_item_id: meal.id,
            portion_size: 100.0,
            portion_unit: "portion".to_string(),
            instructions: None,
            is_active: true,
            items: vec![
                RecipeLineInput {
                    item_id: rice.id,
                    quantity: 8.0,
                    unit: "kg".to_string(),
                },
                RecipeLineInput {
                    item_id: chicken.id,
                    quantity: 6.0,
                    unit: "kg".to_string(),
                },
            ],
        }
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("  ")), None);
        assert_eq!(like_pattern(Some("rice")), Some("%rice%".to_string()));
        assert_eq!(like_pattern(Some("50%")), Some("%50\\%%".to_string()));
    }
}
