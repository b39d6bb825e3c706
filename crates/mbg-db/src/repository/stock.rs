//! # Stock Repository
//!
//! Stock rows, the movement ledger and reservations.
//!
//! ## Ledger Functions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every stock mutation goes through one of these, inside a transaction  │
//! │                                                                         │
//! │  credit(item, location, batch, qty)   quantity += qty      + movement  │
//! │  debit_row(stock, qty)                quantity -= qty      + movement  │
//! │  reserve(item, location, qty, ref)    reserved += (FEFO)   + rows in   │
//! │                                                            reservations│
//! │  consume(ref)                         quantity -= held     + movement  │
//! │                                       reserved -= held                 │
//! │  release(ref)                         reserved -= held                 │
//! │                                                                         │
//! │  After each call: 0 <= reserved_quantity <= quantity                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities are computed in Rust and written back as absolute values, so
//! float noise is snapped before it reaches the CHECK constraints.

use chrono::{NaiveDate, Utc};
use mbg_core::input::{NewStock, StockAdjustment, StockTransfer};
use mbg_core::stock::{allocate_fefo, apply_delta, check_row, snap, StockSummary};
use mbg_core::{
    CoreError, Item, MovementType, Page, PageRequest, ReferenceType, Stock, StockMovement,
    StockReservation, StockView,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{begin_posting, ensure_exists, like_pattern, new_id};
use crate::error::{DbError, DbResult};

// =============================================================================
// Postings
// =============================================================================

/// Who and what a movement is attributed to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Posting<'a> {
    pub movement_type: MovementType,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<&'a str>,
    pub note: Option<&'a str>,
    pub created_by: Option<&'a str>,
}

impl<'a> Posting<'a> {
    pub fn new(movement_type: MovementType) -> Self {
        Posting {
            movement_type,
            reference_type: None,
            reference_id: None,
            note: None,
            created_by: None,
        }
    }

    pub fn reference(mut self, reference_type: ReferenceType, id: &'a str) -> Self {
        self.reference_type = Some(reference_type);
        self.reference_id = Some(id);
        self
    }

    pub fn note(mut self, note: Option<&'a str>) -> Self {
        self.note = note;
        self
    }

    pub fn by(mut self, user_id: Option<&'a str>) -> Self {
        self.created_by = user_id;
        self
    }

    fn with_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = movement_type;
        self
    }
}

// =============================================================================
// Ledger Functions
// =============================================================================

pub(crate) async fn fetch_stock(conn: &mut SqliteConnection, id: &str) -> DbResult<Stock> {
    sqlx::query_as::<_, Stock>("SELECT * FROM stocks WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Stock", id))
}

async fn find_row(
    conn: &mut SqliteConnection,
    item_id: &str,
    location_id: &str,
    batch_number: &str,
) -> DbResult<Option<Stock>> {
    let stock = sqlx::query_as::<_, Stock>(
        "SELECT * FROM stocks WHERE item_id = ?1 AND location_id = ?2 AND batch_number = ?3",
    )
    .bind(item_id)
    .bind(location_id)
    .bind(batch_number)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(stock)
}

/// All rows of one item at one location, optionally one batch only.
async fn rows_for(
    conn: &mut SqliteConnection,
    item_id: &str,
    location_id: &str,
    batch_number: Option<&str>,
) -> DbResult<Vec<Stock>> {
    let rows = sqlx::query_as::<_, Stock>(
        r#"
        SELECT * FROM stocks
        WHERE item_id = ?1 AND location_id = ?2
          AND (?3 IS NULL OR batch_number = ?3)
        "#,
    )
    .bind(item_id)
    .bind(location_id)
    .bind(batch_number)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// SKU used to label stock errors.
async fn item_label(conn: &mut SqliteConnection, item_id: &str) -> DbResult<String> {
    sqlx::query_scalar::<_, String>("SELECT sku FROM items WHERE id = ?1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Item", item_id))
}

async fn write_quantities(conn: &mut SqliteConnection, stock: &mut Stock) -> DbResult<()> {
    stock.quantity = snap(stock.quantity).max(0.0);
    stock.reserved_quantity = snap(stock.reserved_quantity).max(0.0);
    check_row(&stock.id, stock.quantity, stock.reserved_quantity)?;
    stock.updated_at = Utc::now();

    sqlx::query(
        "UPDATE stocks SET quantity = ?2, reserved_quantity = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(&stock.id)
    .bind(stock.quantity)
    .bind(stock.reserved_quantity)
    .bind(stock.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_row(
    conn: &mut SqliteConnection,
    item_id: &str,
    location_id: &str,
    batch_number: &str,
    expiry_date: Option<NaiveDate>,
    quantity: f64,
) -> DbResult<Stock> {
    let now = Utc::now();
    let stock = Stock {
        id: new_id(),
        item_id: item_id.to_string(),
        location_id: location_id.to_string(),
        quantity,
        reserved_quantity: 0.0,
        batch_number: batch_number.trim().to_string(),
        expiry_date,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stocks (
            id, item_id, location_id, quantity, reserved_quantity,
            batch_number, expiry_date, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&stock.id)
    .bind(&stock.item_id)
    .bind(&stock.location_id)
    .bind(stock.quantity)
    .bind(stock.reserved_quantity)
    .bind(&stock.batch_number)
    .bind(stock.expiry_date)
    .bind(stock.created_at)
    .bind(stock.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(stock)
}

/// Appends one signed change to the movement ledger.
pub(crate) async fn record_movement(
    conn: &mut SqliteConnection,
    stock: &Stock,
    quantity: f64,
    posting: Posting<'_>,
) -> DbResult<StockMovement> {
    let movement = StockMovement {
        id: new_id(),
        stock_id: stock.id.clone(),
        item_id: stock.item_id.clone(),
        location_id: stock.location_id.clone(),
        movement_type: posting.movement_type,
        quantity,
        reference_type: posting.reference_type,
        reference_id: posting.reference_id.map(str::to_string),
        note: posting.note.map(str::to_string),
        created_by: posting.created_by.map(str::to_string),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, stock_id, item_id, location_id, movement_type, quantity,
            reference_type, reference_id, note, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.stock_id)
    .bind(&movement.item_id)
    .bind(&movement.location_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.reference_type)
    .bind(&movement.reference_id)
    .bind(&movement.note)
    .bind(&movement.created_by)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        stock_id = %movement.stock_id,
        movement_type = %movement.movement_type,
        quantity = movement.quantity,
        "Recorded stock movement"
    );
    Ok(movement)
}

/// Adds `quantity` to the `(item, location, batch)` row, creating it if needed.
///
/// An existing row without an expiry date takes `expiry_date`.
pub(crate) async fn credit(
    conn: &mut SqliteConnection,
    item_id: &str,
    location_id: &str,
    batch_number: &str,
    expiry_date: Option<NaiveDate>,
    quantity: f64,
    posting: Posting<'_>,
) -> DbResult<(Stock, StockMovement)> {
    let batch_number = batch_number.trim();
    let mut stock = match find_row(conn, item_id, location_id, batch_number).await? {
        Some(mut stock) => {
            stock.quantity += quantity;
            write_quantities(conn, &mut stock).await?;
            if stock.expiry_date.is_none() && expiry_date.is_some() {
                sqlx::query("UPDATE stocks SET expiry_date = ?2 WHERE id = ?1")
                    .bind(&stock.id)
                    .bind(expiry_date)
                    .execute(&mut *conn)
                    .await?;
            }
            stock
        }
        None => insert_row(conn, item_id, location_id, batch_number, expiry_date, quantity).await?,
    };
    if stock.expiry_date.is_none() {
        stock.expiry_date = expiry_date;
    }

    let movement = record_movement(conn, &stock, quantity, posting).await?;
    Ok((stock, movement))
}

/// Removes `quantity` from one row's unreserved part.
pub(crate) async fn debit_row(
    conn: &mut SqliteConnection,
    stock: &mut Stock,
    quantity: f64,
    posting: Posting<'_>,
) -> DbResult<StockMovement> {
    stock.quantity = apply_delta(stock, -quantity)?;
    write_quantities(conn, stock).await?;
    record_movement(conn, stock, -quantity, posting).await
}

/// Holds `quantity` of an item at a location for a document, FEFO across
/// batches.
///
/// ## Errors
/// `InsufficientStock` if the location's available quantity is short.
/// Nothing is written in that case.
pub(crate) async fn reserve(
    conn: &mut SqliteConnection,
    item_id: &str,
    location_id: &str,
    quantity: f64,
    reference_type: ReferenceType,
    reference_id: &str,
) -> DbResult<Vec<StockReservation>> {
    let label = item_label(conn, item_id).await?;
    let rows = rows_for(conn, item_id, location_id, None).await?;
    let plan = allocate_fefo(&rows, &label, quantity)?;

    let mut by_id: HashMap<String, Stock> = rows.into_iter().map(|s| (s.id.clone(), s)).collect();
    let mut reservations = Vec::with_capacity(plan.len());

    for allocation in plan {
        let Some(stock) = by_id.get_mut(&allocation.stock_id) else {
            continue;
        };
        stock.reserved_quantity += allocation.quantity;
        write_quantities(conn, stock).await?;

        let reservation = StockReservation {
            id: new_id(),
            stock_id: stock.id.clone(),
            reference_type,
            reference_id: reference_id.to_string(),
            quantity: allocation.quantity,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"
            INSERT INTO stock_reservations (id, stock_id, reference_type, reference_id, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.stock_id)
        .bind(reservation.reference_type)
        .bind(&reservation.reference_id)
        .bind(reservation.quantity)
        .bind(reservation.created_at)
        .execute(&mut *conn)
        .await?;

        reservations.push(reservation);
    }

    debug!(
        item = %label,
        location_id = %location_id,
        quantity,
        rows = reservations.len(),
        "Reserved stock"
    );
    Ok(reservations)
}

pub(crate) async fn reservations_for(
    conn: &mut SqliteConnection,
    reference_type: ReferenceType,
    reference_id: &str,
) -> DbResult<Vec<StockReservation>> {
    let rows = sqlx::query_as::<_, StockReservation>(
        r#"
        SELECT * FROM stock_reservations
        WHERE reference_type = ?1 AND reference_id = ?2
        ORDER BY created_at, id
        "#,
    )
    .bind(reference_type)
    .bind(reference_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn delete_reservations(
    conn: &mut SqliteConnection,
    reference_type: ReferenceType,
    reference_id: &str,
) -> DbResult<()> {
    sqlx::query("DELETE FROM stock_reservations WHERE reference_type = ?1 AND reference_id = ?2")
        .bind(reference_type)
        .bind(reference_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Turns a document's reservations into real outflows.
///
/// Each reserved row loses the held amount from both `quantity` and
/// `reserved_quantity`, and gets a negative movement of `posting`'s type.
pub(crate) async fn consume_reservations(
    conn: &mut SqliteConnection,
    reference_type: ReferenceType,
    reference_id: &str,
    posting: Posting<'_>,
) -> DbResult<Vec<StockMovement>> {
    let reservations = reservations_for(conn, reference_type, reference_id).await?;
    let mut movements = Vec::with_capacity(reservations.len());

    for reservation in &reservations {
        let mut stock = fetch_stock(conn, &reservation.stock_id).await?;
        stock.quantity -= reservation.quantity;
        stock.reserved_quantity -= reservation.quantity;
        write_quantities(conn, &mut stock).await?;
        movements.push(
            record_movement(
                conn,
                &stock,
                -reservation.quantity,
                posting.reference(reference_type, reference_id),
            )
            .await?,
        );
    }

    delete_reservations(conn, reference_type, reference_id).await?;
    Ok(movements)
}

/// Drops a document's reservations, returning the stock to available.
pub(crate) async fn release_reservations(
    conn: &mut SqliteConnection,
    reference_type: ReferenceType,
    reference_id: &str,
) -> DbResult<usize> {
    let reservations = reservations_for(conn, reference_type, reference_id).await?;

    for reservation in &reservations {
        let mut stock = fetch_stock(conn, &reservation.stock_id).await?;
        stock.reserved_quantity -= reservation.quantity;
        write_quantities(conn, &mut stock).await?;
    }

    delete_reservations(conn, reference_type, reference_id).await?;
    debug!(reference_id = %reference_id, count = reservations.len(), "Released reservations");
    Ok(reservations.len())
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub page: PageRequest,
    pub item_id: Option<String>,
    pub location_id: Option<String>,
    /// Matches item sku / name or batch number.
    pub search: Option<String>,
    /// Only rows with something on hand.
    pub in_stock_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub page: PageRequest,
    pub stock_id: Option<String>,
    pub item_id: Option<String>,
    pub location_id: Option<String>,
    pub movement_type: Option<MovementType>,
    pub reference_id: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock rows and their ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    pub async fn list(&self, filter: &StockFilter) -> DbResult<Page<StockView>> {
        let pattern = like_pattern(filter.search.as_deref());
        const WHERE: &str = r#"
            FROM stocks s
            JOIN items i ON i.id = s.item_id
            WHERE (?1 IS NULL OR s.item_id = ?1)
              AND (?2 IS NULL OR s.location_id = ?2)
              AND (?3 IS NULL OR i.sku LIKE ?3 ESCAPE '\' OR i.name LIKE ?3 ESCAPE '\'
                   OR s.batch_number LIKE ?3 ESCAPE '\')
              AND (?4 = 0 OR s.quantity > 0)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&filter.item_id)
            .bind(&filter.location_id)
            .bind(&pattern)
            .bind(filter.in_stock_only)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Stock>(&format!(
            "SELECT s.* {WHERE} ORDER BY i.name, s.expiry_date IS NULL, s.expiry_date, s.batch_number LIMIT ?5 OFFSET ?6"
        ))
        .bind(&filter.item_id)
        .bind(&filter.location_id)
        .bind(&pattern)
        .bind(filter.in_stock_only)
        .bind(filter.page.limit())
        .bind(filter.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, filter.page, total).map(StockView::from))
    }

    pub async fn get(&self, id: &str) -> DbResult<StockView> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_stock(&mut conn, id).await?.into())
    }

    /// Records an opening balance as a new row.
    ///
    /// ## Errors
    /// - `UniqueViolation(itemId, locationId, batchNumber)` if the row exists
    /// - `NotFound` for an unknown item or location
    pub async fn create(&self, input: &NewStock, user_id: Option<&str>) -> DbResult<StockView> {
        input.validate()?;
        debug!(item_id = %input.item_id, location_id = %input.location_id, "Creating stock row");

        let mut tx = begin_posting(&self.pool).await?;
        ensure_exists(&mut tx, "items", "Item", &input.item_id).await?;
        ensure_exists(&mut tx, "locations", "Location", &input.location_id).await?;

        let stock = insert_row(
            &mut tx,
            &input.item_id,
            &input.location_id,
            &input.batch_number,
            input.expiry_date,
            input.quantity,
        )
        .await?;

        if input.quantity > 0.0 {
            let posting = Posting::new(MovementType::Adjustment)
                .note(Some("Opening balance"))
                .by(user_id);
            record_movement(&mut tx, &stock, input.quantity, posting).await?;
        }

        tx.commit().await?;
        Ok(stock.into())
    }

    /// Applies a manual correction and logs it as an ADJUSTMENT.
    pub async fn adjust(
        &self,
        input: &StockAdjustment,
        user_id: Option<&str>,
    ) -> DbResult<(StockView, StockMovement)> {
        input.validate()?;
        let mut tx = begin_posting(&self.pool).await?;

        let posting = Posting {
            reference_type: Some(ReferenceType::Manual),
            ..Posting::new(MovementType::Adjustment)
                .note(Some(input.reason.as_str()))
                .by(user_id)
        };

        let existing = match &input.stock_id {
            Some(id) => Some(fetch_stock(&mut tx, id).await?),
            None => {
                let item_id = input.item_id.as_deref().unwrap_or_default();
                let location_id = input.location_id.as_deref().unwrap_or_default();
                ensure_exists(&mut tx, "items", "Item", item_id).await?;
                ensure_exists(&mut tx, "locations", "Location", location_id).await?;
                find_row(&mut tx, item_id, location_id, input.batch_number.trim()).await?
            }
        };

        let (stock, movement) = match existing {
            Some(mut stock) if input.delta < 0.0 => {
                let movement = debit_row(&mut tx, &mut stock, -input.delta, posting).await?;
                (stock, movement)
            }
            Some(stock) => {
                credit(
                    &mut tx,
                    &stock.item_id,
                    &stock.location_id,
                    &stock.batch_number,
                    input.expiry_date,
                    input.delta,
                    posting,
                )
                .await?
            }
            None if input.delta > 0.0 => {
                credit(
                    &mut tx,
                    input.item_id.as_deref().unwrap_or_default(),
                    input.location_id.as_deref().unwrap_or_default(),
                    &input.batch_number,
                    input.expiry_date,
                    input.delta,
                    posting,
                )
                .await?
            }
            None => {
                let item = item_label(&mut tx, input.item_id.as_deref().unwrap_or_default()).await?;
                return Err(CoreError::InsufficientStock {
                    item,
                    available: 0.0,
                    requested: -input.delta,
                }
                .into());
            }
        };

        tx.commit().await?;
        info!(stock_id = %stock.id, delta = input.delta, "Stock adjusted");
        Ok((stock.into(), movement))
    }

    /// Moves stock between locations, keeping batch numbers and expiry.
    ///
    /// Returns the movements written, OUT and IN alternating per batch.
    pub async fn transfer(
        &self,
        input: &StockTransfer,
        user_id: Option<&str>,
    ) -> DbResult<Vec<StockMovement>> {
        input.validate()?;
        let mut tx = begin_posting(&self.pool).await?;

        ensure_exists(&mut tx, "locations", "Location", &input.from_location_id).await?;
        ensure_exists(&mut tx, "locations", "Location", &input.to_location_id).await?;
        let label = item_label(&mut tx, &input.item_id).await?;

        let batch = input.batch_number.as_deref().map(str::trim);
        let rows = rows_for(&mut tx, &input.item_id, &input.from_location_id, batch).await?;
        let plan = allocate_fefo(&rows, &label, input.quantity)?;

        let mut by_id: HashMap<String, Stock> =
            rows.into_iter().map(|s| (s.id.clone(), s)).collect();
        let transfer_id = new_id();
        let base = Posting::new(MovementType::TransferOut)
            .reference(ReferenceType::Manual, &transfer_id)
            .note(input.note.as_deref())
            .by(user_id);

        let mut movements = Vec::with_capacity(plan.len() * 2);
        for allocation in plan {
            let Some(source) = by_id.get_mut(&allocation.stock_id) else {
                continue;
            };
            movements.push(debit_row(&mut tx, source, allocation.quantity, base).await?);

            let (_, inbound) = credit(
                &mut tx,
                &input.item_id,
                &input.to_location_id,
                &allocation.batch_number,
                allocation.expiry_date,
                allocation.quantity,
                base.with_type(MovementType::TransferIn),
            )
            .await?;
            movements.push(inbound);
        }

        tx.commit().await?;
        info!(
            item = %label,
            from = %input.from_location_id,
            to = %input.to_location_id,
            quantity = input.quantity,
            "Stock transferred"
        );
        Ok(movements)
    }

    pub async fn movements(&self, filter: &MovementFilter) -> DbResult<Page<StockMovement>> {
        const WHERE: &str = r#"
            FROM stock_movements
            WHERE (?1 IS NULL OR stock_id = ?1)
              AND (?2 IS NULL OR item_id = ?2)
              AND (?3 IS NULL OR location_id = ?3)
              AND (?4 IS NULL OR movement_type = ?4)
              AND (?5 IS NULL OR reference_id = ?5)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&filter.stock_id)
            .bind(&filter.item_id)
            .bind(&filter.location_id)
            .bind(filter.movement_type)
            .bind(&filter.reference_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT * {WHERE} ORDER BY created_at DESC, id LIMIT ?6 OFFSET ?7"
        ))
        .bind(&filter.stock_id)
        .bind(&filter.item_id)
        .bind(&filter.location_id)
        .bind(filter.movement_type)
        .bind(&filter.reference_id)
        .bind(filter.page.limit())
        .bind(filter.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, filter.page, total))
    }

    /// Per-item totals across all batches, optionally within one location.
    ///
    /// Every active item appears, including those with no stock rows.
    pub async fn summary(&self, location_id: Option<&str>) -> DbResult<Vec<StockSummary>> {
        let items = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE is_active = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let totals: Vec<(String, f64, f64)> = sqlx::query_as(
            r#"
            SELECT item_id, COALESCE(SUM(quantity), 0.0), COALESCE(SUM(reserved_quantity), 0.0)
            FROM stocks
            WHERE (?1 IS NULL OR location_id = ?1)
            GROUP BY item_id
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        let totals: HashMap<String, (f64, f64)> = totals
            .into_iter()
            .map(|(item_id, quantity, reserved)| (item_id, (quantity, reserved)))
            .collect();

        Ok(items
            .iter()
            .map(|item| {
                let (quantity, reserved) = totals.get(&item.id).copied().unwrap_or((0.0, 0.0));
                StockSummary::new(item, location_id.map(str::to_string), quantity, reserved)
            })
            .collect())
    }

    /// Reservations currently held by a document.
    pub async fn reservations(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> DbResult<Vec<StockReservation>> {
        let mut conn = self.pool.acquire().await?;
        reservations_for(&mut conn, reference_type, reference_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
