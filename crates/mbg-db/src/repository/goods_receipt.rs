//! # Goods Receipt Repository
//!
//! Posting a receipt is one transaction:
//!
//! ```text
//! GR-20260301-0001 against PO-20260228-0003 (SUBMITTED)
//!   │
//!   ├─ per line: qty <= ordered - received        else OverReceipt (422)
//!   ├─ per line: credit destination stock (batch, expiry), RECEIPT movement
//!   ├─ per line: received_quantity += qty
//!   └─ PO status := RECEIVED if every line is complete,
//!                   PARTIALLY_RECEIVED otherwise
//! ```

use chrono::Utc;
use mbg_core::input::GoodsReceiptInput;
use mbg_core::stock::covers;
use mbg_core::{
    CoreError, GoodsReceipt, GoodsReceiptDetail, GoodsReceiptItem, MovementType, Page,
    PageRequest, PurchaseOrderStatus, ReferenceType,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::purchase_order::{fetch_lines, fetch_order, set_status};
use super::sequence::{next_number, DocumentKind};
use super::stock::{credit, Posting};
use super::{begin_posting, like_pattern, new_id};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Default)]
pub struct GoodsReceiptFilter {
    pub page: PageRequest,
    /// Matches the receipt number.
    pub search: Option<String>,
    pub purchase_order_id: Option<String>,
}

async fn fetch_receipt(conn: &mut SqliteConnection, id: &str) -> DbResult<GoodsReceipt> {
    sqlx::query_as::<_, GoodsReceipt>("SELECT * FROM goods_receipts WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Goods receipt", id))
}

async fn fetch_receipt_lines(
    conn: &mut SqliteConnection,
    receipt_id: &str,
) -> DbResult<Vec<GoodsReceiptItem>> {
    let lines = sqlx::query_as::<_, GoodsReceiptItem>(
        "SELECT * FROM goods_receipt_items WHERE goods_receipt_id = ?1 ORDER BY rowid",
    )
    .bind(receipt_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

#[derive(Debug, Clone)]
pub struct GoodsReceiptRepository {
    pool: SqlitePool,
}

impl GoodsReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GoodsReceiptRepository { pool }
    }

    pub async fn list(&self, filter: &GoodsReceiptFilter) -> DbResult<Page<GoodsReceipt>> {
        let pattern = like_pattern(filter.search.as_deref());
        const WHERE: &str = r#"
            FROM goods_receipts
            WHERE (?1 IS NULL OR receipt_number LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR purchase_order_id = ?2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(&filter.purchase_order_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, GoodsReceipt>(&format!(
            "SELECT * {WHERE} ORDER BY created_at DESC LIMIT ?3 OFFSET ?4"
        ))
        .bind(&pattern)
        .bind(&filter.purchase_order_id)
        .bind(filter.page.limit())
        .bind(filter.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, filter.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<GoodsReceiptDetail> {
        let mut conn = self.pool.acquire().await?;
        let receipt = fetch_receipt(&mut conn, id).await?;
        let items = fetch_receipt_lines(&mut conn, id).await?;
        Ok(GoodsReceiptDetail { receipt, items })
    }

    /// Posts a receipt against a SUBMITTED or PARTIALLY_RECEIVED order.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown order or order line
    /// - `InvalidStatusTransition` if the order does not accept receipts
    /// - `OverReceipt` if a line exceeds its outstanding quantity
    pub async fn create(
        &self,
        input: &GoodsReceiptInput,
        user_id: Option<&str>,
    ) -> DbResult<GoodsReceiptDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, &input.purchase_order_id).await?;
        if !order.status.accepts_receipts() {
            return Err(CoreError::transition(
                "Purchase order",
                &order.po_number,
                order.status,
                PurchaseOrderStatus::PartiallyReceived,
            )
            .into());
        }
        let mut lines = fetch_lines(&mut tx, &order.id).await?;

        let now = Utc::now();
        let receipt = GoodsReceipt {
            id: new_id(),
            receipt_number: next_number(&mut tx, DocumentKind::GoodsReceipt, now.date_naive())
                .await?,
            purchase_order_id: order.id.clone(),
            location_id: order.destination_location_id.clone(),
            received_date: input.received_date.unwrap_or_else(|| now.date_naive()),
            received_by: user_id.map(str::to_string),
            notes: input.notes.clone(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO goods_receipts (
                id, receipt_number, purchase_order_id, location_id, received_date,
                received_by, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.receipt_number)
        .bind(&receipt.purchase_order_id)
        .bind(&receipt.location_id)
        .bind(receipt.received_date)
        .bind(&receipt.received_by)
        .bind(&receipt.notes)
        .bind(receipt.created_at)
        .execute(&mut *tx)
        .await?;

        let posting = Posting::new(MovementType::Receipt)
            .reference(ReferenceType::GoodsReceipt, &receipt.id)
            .note(Some(receipt.receipt_number.as_str()))
            .by(user_id);

        let mut items = Vec::with_capacity(input.items.len());
        for line_input in &input.items {
            let line = lines
                .iter_mut()
                .find(|l| l.id == line_input.purchase_order_item_id)
                .ok_or_else(|| {
                    DbError::not_found("Purchase order line", &line_input.purchase_order_item_id)
                })?;

            let outstanding = line.outstanding();
            if !covers(outstanding, line_input.quantity) {
                let sku: String = sqlx::query_scalar("SELECT sku FROM items WHERE id = ?1")
                    .bind(&line.item_id)
                    .fetch_one(&mut *tx)
                    .await?;
                return Err(CoreError::OverReceipt {
                    item: sku,
                    outstanding,
                    received: line_input.quantity,
                }
                .into());
            }

            credit(
                &mut tx,
                &line.item_id,
                &receipt.location_id,
                &line_input.batch_number,
                line_input.expiry_date,
                line_input.quantity,
                posting,
            )
            .await?;

            line.received_quantity = (line.received_quantity + line_input.quantity).min(line.quantity);
            sqlx::query("UPDATE purchase_order_items SET received_quantity = ?2 WHERE id = ?1")
                .bind(&line.id)
                .bind(line.received_quantity)
                .execute(&mut *tx)
                .await?;

            let item = GoodsReceiptItem {
                id: new_id(),
                goods_receipt_id: receipt.id.clone(),
                purchase_order_item_id: line.id.clone(),
                item_id: line.item_id.clone(),
                quantity: line_input.quantity,
                batch_number: line_input.batch_number.trim().to_string(),
                expiry_date: line_input.expiry_date,
            };
            sqlx::query(
                r#"
                INSERT INTO goods_receipt_items (
                    id, goods_receipt_id, purchase_order_item_id, item_id,
                    quantity, batch_number, expiry_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.goods_receipt_id)
            .bind(&item.purchase_order_item_id)
            .bind(&item.item_id)
            .bind(item.quantity)
            .bind(&item.batch_number)
            .bind(item.expiry_date)
            .execute(&mut *tx)
            .await?;
            items.push(item);
        }

        let fully_received = lines.iter().all(|l| l.outstanding() <= mbg_core::QUANTITY_EPSILON);
        set_status(
            &mut tx,
            &mut order,
            PurchaseOrderStatus::after_receipt(fully_received),
        )
        .await?;

        tx.commit().await?;

        info!(
            receipt_number = %receipt.receipt_number,
            po_number = %order.po_number,
            po_status = %order.status,
            lines = items.len(),
            "Posted goods receipt"
        );
        Ok(GoodsReceiptDetail { receipt, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::stock::{MovementFilter, StockFilter};
    use crate::repository::test_support::{date, db, item, location, supplier};
    use crate::Database;
    use mbg_core::input::{GoodsReceiptLineInput, PurchaseOrderInput, PurchaseOrderLineInput};
    use mbg_core::{ItemType, LocationType, PurchaseOrderDetail};

    async fn submitted_order(db: &Database, quantity: f64) -> PurchaseOrderDetail {
        let wh = location(db, "WH-1", LocationType::CentralWarehouse).await;
        let rice = item(db, "RICE", ItemType::RawMaterial, 1_000).await;
        let detail = db
            .purchase_orders()
            .create(
                &PurchaseOrderInput {
                    supplier_id: supplier(db).await.id,
                    destination_location_id: wh.id,
                    order_date: None,
                    expected_date: None,
                    notes: None,
                    items: vec![PurchaseOrderLineInput {
                        item_id: rice.id,
                        quantity,
                        unit_price_cents: 1_000,
                    }],
                },
                None,
            )
            .await
            .unwrap();
        db.purchase_orders().submit(&detail.order.id).await.unwrap();
        detail
    }

    fn receipt(order: &PurchaseOrderDetail, quantity: f64, batch: &str) -> GoodsReceiptInput {
        GoodsReceiptInput {
            purchase_order_id: order.order.id.clone(),
            received_date: None,
            notes: None,
            items: vec![GoodsReceiptLineInput {
                purchase_order_item_id: order.items[0].id.clone(),
                quantity,
                batch_number: batch.to_string(),
                expiry_date: Some(date(2027, 1, 31)),
            }],
        }
    }

    #[tokio::test]
    async fn test_partial_then_full_receipt() {
        let db = db().await;
        let order = submitted_order(&db, 100.0).await;

        let first = db.goods_receipts().create(&receipt(&order, 60.0, "B1"), None).await.unwrap();
        assert!(first.receipt.receipt_number.starts_with("GR-"));
        let po = db.purchase_orders().get(&order.order.id).await.unwrap();
        assert_eq!(po.order.status, PurchaseOrderStatus::PartiallyReceived);
        assert_eq!(po.items[0].received_quantity, 60.0);

        db.goods_receipts().create(&receipt(&order, 40.0, "B2"), None).await.unwrap();
        let po = db.purchase_orders().get(&order.order.id).await.unwrap();
        assert_eq!(po.order.status, PurchaseOrderStatus::Received);

        let stock = db.stock().list(&StockFilter::default()).await.unwrap();
        assert_eq!(stock.items.len(), 2);
        let total: f64 = stock.items.iter().map(|s| s.stock.quantity).sum();
        assert_eq!(total, 100.0);

        let movements = db
            .stock()
            .movements(&MovementFilter {
                movement_type: Some(MovementType::Receipt),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_over_receipt_leaves_nothing_behind() {
        let db = db().await;
        let order = submitted_order(&db, 10.0).await;

        let err = db
            .goods_receipts()
            .create(&receipt(&order, 10.5, "B1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::OverReceipt { ref item, .. }) if item == "RICE"));

        let stock = db.stock().list(&StockFilter::default()).await.unwrap();
        assert!(stock.items.is_empty());
        let receipts = db.goods_receipts().list(&GoodsReceiptFilter::default()).await.unwrap();
        assert_eq!(receipts.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_received_order_rejects_receipts() {
        let db = db().await;
        let order = submitted_order(&db, 10.0).await;
        db.goods_receipts().create(&receipt(&order, 10.0, ""), None).await.unwrap();

        let err = db
            .goods_receipts()
            .create(&receipt(&order, 1.0, ""), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidStatusTransition { .. })
        ));
    }
}
