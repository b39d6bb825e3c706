//! # Purchase Order Repository
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   DRAFT ──submit──► SUBMITTED ──receipt──► PARTIALLY_RECEIVED          │
//! │     │                  │                        │                       │
//! │     │ (edit/delete)    │                        └──receipt──► RECEIVED │
//! │     │                  │                                                │
//! │     └──cancel──► CANCELLED ◄──cancel──┘                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Receipts are posted by [`GoodsReceiptRepository`](super::goods_receipt::GoodsReceiptRepository),
//! which moves the order to PARTIALLY_RECEIVED or RECEIVED.

use chrono::Utc;
use mbg_core::input::PurchaseOrderInput;
use mbg_core::status::check_purchase_order;
use mbg_core::{
    CoreError, Money, Page, PageRequest, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderItem,
    PurchaseOrderStatus,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::sequence::{next_number, DocumentKind};
use super::{begin_posting, ensure_exists, like_pattern, new_id};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilter {
    pub page: PageRequest,
    /// Matches the PO number.
    pub search: Option<String>,
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<String>,
}

// =============================================================================
// Shared Queries
// =============================================================================

pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<PurchaseOrder> {
    sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase order", id))
}

pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<PurchaseOrderItem>> {
    let lines = sqlx::query_as::<_, PurchaseOrderItem>(
        "SELECT * FROM purchase_order_items WHERE purchase_order_id = ?1 ORDER BY rowid",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    order: &mut PurchaseOrder,
    to: PurchaseOrderStatus,
) -> DbResult<()> {
    check_purchase_order(&order.po_number, order.status, to)?;
    order.status = to;
    order.updated_at = Utc::now();
    sqlx::query("UPDATE purchase_orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(&order.id)
        .bind(order.status)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn ensure_editable(order: &PurchaseOrder) -> DbResult<()> {
    if order.status.is_editable() {
        Ok(())
    } else {
        Err(CoreError::Locked {
            entity: "Purchase order".to_string(),
            number: order.po_number.clone(),
            status: order.status.to_string(),
        }
        .into())
    }
}

/// Checks references and writes the lines, returning the order total.
async fn write_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
    input: &PurchaseOrderInput,
) -> DbResult<Money> {
    let mut total = Money::zero();
    for line in &input.items {
        ensure_exists(conn, "items", "Item", &line.item_id).await?;
        let item = PurchaseOrderItem {
            id: new_id(),
            purchase_order_id: order_id.to_string(),
            item_id: line.item_id.clone(),
            quantity: line.quantity,
            received_quantity: 0.0,
            unit_price_cents: line.unit_price_cents,
        };
        total = item
            .line_total()
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| CoreError::overflow("purchase order total"))?;

        sqlx::query(
            r#"
            INSERT INTO purchase_order_items (
                id, purchase_order_id, item_id, quantity, received_quantity, unit_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.purchase_order_id)
        .bind(&item.item_id)
        .bind(item.quantity)
        .bind(item.received_quantity)
        .bind(item.unit_price_cents)
        .execute(&mut *conn)
        .await?;
    }
    Ok(total)
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    pub async fn list(&self, filter: &PurchaseOrderFilter) -> DbResult<Page<PurchaseOrder>> {
        let pattern = like_pattern(filter.search.as_deref());
        const WHERE: &str = r#"
            FROM purchase_orders
            WHERE (?1 IS NULL OR po_number LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR supplier_id = ?3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(filter.status)
            .bind(&filter.supplier_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT * {WHERE} ORDER BY created_at DESC LIMIT ?4 OFFSET ?5"
        ))
        .bind(&pattern)
        .bind(filter.status)
        .bind(&filter.supplier_id)
        .bind(filter.page.limit())
        .bind(filter.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, filter.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<PurchaseOrderDetail> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        let items = fetch_lines(&mut conn, id).await?;
        Ok(PurchaseOrderDetail { order, items })
    }

    /// Creates a DRAFT order with a fresh `PO-YYYYMMDD-NNNN` number.
    pub async fn create(
        &self,
        input: &PurchaseOrderInput,
        user_id: Option<&str>,
    ) -> DbResult<PurchaseOrderDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        ensure_exists(&mut tx, "suppliers", "Supplier", &input.supplier_id).await?;
        ensure_exists(&mut tx, "locations", "Location", &input.destination_location_id).await?;

        let now = Utc::now();
        let order_date = input.order_date.unwrap_or_else(|| now.date_naive());
        let id = new_id();
        let po_number = next_number(&mut tx, DocumentKind::PurchaseOrder, now.date_naive()).await?;

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, po_number, supplier_id, destination_location_id, status,
                order_date, expected_date, notes, total_cents, created_by,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&po_number)
        .bind(&input.supplier_id)
        .bind(&input.destination_location_id)
        .bind(PurchaseOrderStatus::Draft)
        .bind(order_date)
        .bind(input.expected_date)
        .bind(&input.notes)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let total = write_lines(&mut tx, &id, input).await?;
        sqlx::query("UPDATE purchase_orders SET total_cents = ?2 WHERE id = ?1")
            .bind(&id)
            .bind(total.cents())
            .execute(&mut *tx)
            .await?;

        let order = fetch_order(&mut tx, &id).await?;
        let items = fetch_lines(&mut tx, &id).await?;
        tx.commit().await?;

        info!(po_number = %order.po_number, total = %total, lines = items.len(), "Created purchase order");
        Ok(PurchaseOrderDetail { order, items })
    }

    /// Replaces header and lines of a DRAFT order.
    pub async fn update(&self, id: &str, input: &PurchaseOrderInput) -> DbResult<PurchaseOrderDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        let order = fetch_order(&mut tx, id).await?;
        ensure_editable(&order)?;
        ensure_exists(&mut tx, "suppliers", "Supplier", &input.supplier_id).await?;
        ensure_exists(&mut tx, "locations", "Location", &input.destination_location_id).await?;

        sqlx::query("DELETE FROM purchase_order_items WHERE purchase_order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let total = write_lines(&mut tx, id, input).await?;

        sqlx::query(
            r#"
            UPDATE purchase_orders SET
                supplier_id = ?2, destination_location_id = ?3, order_date = ?4,
                expected_date = ?5, notes = ?6, total_cents = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.supplier_id)
        .bind(&input.destination_location_id)
        .bind(input.order_date.unwrap_or(order.order_date))
        .bind(input.expected_date)
        .bind(&input.notes)
        .bind(total.cents())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let order = fetch_order(&mut tx, id).await?;
        let items = fetch_lines(&mut tx, id).await?;
        tx.commit().await?;

        debug!(po_number = %order.po_number, "Updated purchase order");
        Ok(PurchaseOrderDetail { order, items })
    }

    /// Deletes a DRAFT order and its lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_posting(&self.pool).await?;
        let order = fetch_order(&mut tx, id).await?;
        ensure_editable(&order)?;

        sqlx::query("DELETE FROM purchase_orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(po_number = %order.po_number, "Deleted purchase order");
        Ok(())
    }

    pub async fn submit(&self, id: &str) -> DbResult<PurchaseOrder> {
        self.transition(id, PurchaseOrderStatus::Submitted).await
    }

    pub async fn cancel(&self, id: &str) -> DbResult<PurchaseOrder> {
        self.transition(id, PurchaseOrderStatus::Cancelled).await
    }

    async fn transition(&self, id: &str, to: PurchaseOrderStatus) -> DbResult<PurchaseOrder> {
        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        set_status(&mut tx, &mut order, to).await?;
        tx.commit().await?;

        info!(po_number = %order.po_number, status = %order.status, "Purchase order status changed");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, item, location, supplier};
    use crate::Database;
    use mbg_core::input::PurchaseOrderLineInput;
    use mbg_core::{ItemType, LocationType};

    async fn draft(db: &Database) -> (PurchaseOrderInput, PurchaseOrderDetail) {
        let wh = location(db, "WH-1", LocationType::CentralWarehouse).await;
        let rice = item(db, "RICE", ItemType::RawMaterial, 1_000).await;
        let oil = item(db, "OIL", ItemType::RawMaterial, 2_500).await;
        let input = PurchaseOrderInput {
            supplier_id: supplier(db).await.id,
            destination_location_id: wh.id,
            order_date: None,
            expected_date: None,
            notes: None,
            items: vec![
                PurchaseOrderLineInput {
                    item_id: rice.id,
                    quantity: 10.0,
                    unit_price_cents: 1_000,
                },
                PurchaseOrderLineInput {
                    item_id: oil.id,
                    quantity: 2.5,
                    unit_price_cents: 2_500,
                },
            ],
        };
        let detail = db.purchase_orders().create(&input, None).await.unwrap();
        (input, detail)
    }

    #[tokio::test]
    async fn test_create_numbers_and_totals() {
        let db = db().await;
        let (_, detail) = draft(&db).await;

        assert!(detail.order.po_number.starts_with("PO-"));
        assert!(detail.order.po_number.ends_with("-0001"));
        assert_eq!(detail.order.status, PurchaseOrderStatus::Draft);
        assert_eq!(detail.order.total_cents, 10_000 + 6_250);
        assert_eq!(detail.items.len(), 2);
    }

    #[tokio::test]
    async fn test_total_past_cent_range_is_rejected() {
        let db = db().await;
        let (mut input, _) = draft(&db).await;
        input.items[0].quantity = 1e9;
        input.items[0].unit_price_cents = mbg_core::validation::MAX_PRICE_CENTS;

        let err = db.purchase_orders().create(&input, None).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::AmountOverflow { .. })));

        let all = db.purchase_orders().list(&PurchaseOrderFilter::default()).await.unwrap();
        assert_eq!(all.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_unknown_item_rolls_back() {
        let db = db().await;
        let (mut input, _) = draft(&db).await;
        input.items[0].item_id = "missing".to_string();

        let err = db.purchase_orders().create(&input, None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let all = db.purchase_orders().list(&PurchaseOrderFilter::default()).await.unwrap();
        assert_eq!(all.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_only_drafts_are_editable() {
        let db = db().await;
        let (mut input, detail) = draft(&db).await;
        let id = detail.order.id.clone();

        input.items.truncate(1);
        let updated = db.purchase_orders().update(&id, &input).await.unwrap();
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.order.total_cents, 10_000);

        db.purchase_orders().submit(&id).await.unwrap();
        assert!(matches!(
            db.purchase_orders().update(&id, &input).await,
            Err(DbError::Core(CoreError::Locked { .. }))
        ));
        assert!(matches!(
            db.purchase_orders().delete(&id).await,
            Err(DbError::Core(CoreError::Locked { .. }))
        ));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let db = db().await;
        let (_, detail) = draft(&db).await;
        let id = detail.order.id;

        db.purchase_orders().cancel(&id).await.unwrap();
        assert!(matches!(
            db.purchase_orders().submit(&id).await,
            Err(DbError::Core(CoreError::InvalidStatusTransition { .. }))
        ));

        let cancelled = db
            .purchase_orders()
            .list(&PurchaseOrderFilter {
                status: Some(PurchaseOrderStatus::Cancelled),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cancelled.items.len(), 1);
    }
}
