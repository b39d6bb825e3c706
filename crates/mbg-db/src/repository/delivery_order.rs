//! # Delivery Order Repository
//!
//! ## Lifecycle
//! ```text
//! PENDING ──dispatch──► DISPATCHED ──deliver──► DELIVERED
//!    │   (reserved at      (stock leaves the         (receivedBy,
//!    │    source)           source: DISPATCH)          deliveredAt)
//!    │
//!    └──cancel──► CANCELLED   (reservations released)
//! ```

use chrono::{NaiveDate, Utc};
use mbg_core::input::{ConfirmDelivery, DeliveryOrderInput};
use mbg_core::status::check_delivery_order;
use mbg_core::{
    DeliveryOrder, DeliveryOrderDetail, DeliveryOrderItem, DeliveryOrderStatus, MovementType,
    Page, PageRequest, ReferenceType, StockMovement,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::sequence::{next_number, DocumentKind};
use super::stock::{consume_reservations, release_reservations, reserve, Posting};
use super::{begin_posting, ensure_exists, like_pattern, new_id};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Default)]
pub struct DeliveryOrderFilter {
    pub page: PageRequest,
    /// Matches the DO number.
    pub search: Option<String>,
    pub status: Option<DeliveryOrderStatus>,
    pub beneficiary_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<DeliveryOrder> {
    sqlx::query_as::<_, DeliveryOrder>("SELECT * FROM delivery_orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Delivery order", id))
}

async fn fetch_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<DeliveryOrderItem>> {
    let lines = sqlx::query_as::<_, DeliveryOrderItem>(
        "SELECT * FROM delivery_order_items WHERE delivery_order_id = ?1 ORDER BY rowid",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

async fn write_status(conn: &mut SqliteConnection, order: &DeliveryOrder) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE delivery_orders SET
            status = ?2, dispatched_at = ?3, delivered_at = ?4,
            received_by = ?5, notes = ?6, updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(order.status)
    .bind(order.dispatched_at)
    .bind(order.delivered_at)
    .bind(&order.received_by)
    .bind(&order.notes)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DeliveryOrderRepository {
    pool: SqlitePool,
}

impl DeliveryOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryOrderRepository { pool }
    }

    pub async fn list(&self, filter: &DeliveryOrderFilter) -> DbResult<Page<DeliveryOrder>> {
        let pattern = like_pattern(filter.search.as_deref());
        const WHERE: &str = r#"
            FROM delivery_orders
            WHERE (?1 IS NULL OR do_number LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR beneficiary_id = ?3)
              AND (?4 IS NULL OR scheduled_date >= ?4)
              AND (?5 IS NULL OR scheduled_date <= ?5)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(filter.status)
            .bind(&filter.beneficiary_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, DeliveryOrder>(&format!(
            "SELECT * {WHERE} ORDER BY scheduled_date DESC, created_at DESC LIMIT ?6 OFFSET ?7"
        ))
        .bind(&pattern)
        .bind(filter.status)
        .bind(&filter.beneficiary_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.page.limit())
        .bind(filter.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, filter.page, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<DeliveryOrderDetail> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        let items = fetch_lines(&mut conn, id).await?;
        Ok(DeliveryOrderDetail { order, items })
    }

    /// Creates a PENDING order and reserves every line at the source.
    ///
    /// ## Errors
    /// `InsufficientStock` if any line exceeds the source's available
    /// quantity; the order is not created in that case.
    pub async fn create(
        &self,
        input: &DeliveryOrderInput,
        user_id: Option<&str>,
    ) -> DbResult<DeliveryOrderDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        ensure_exists(&mut tx, "beneficiaries", "Beneficiary", &input.beneficiary_id).await?;
        ensure_exists(&mut tx, "locations", "Location", &input.source_location_id).await?;

        let now = Utc::now();
        let order = DeliveryOrder {
            id: new_id(),
            do_number: next_number(&mut tx, DocumentKind::DeliveryOrder, now.date_naive()).await?,
            beneficiary_id: input.beneficiary_id.clone(),
            source_location_id: input.source_location_id.clone(),
            status: DeliveryOrderStatus::Pending,
            scheduled_date: input.scheduled_date,
            dispatched_at: None,
            delivered_at: None,
            received_by: None,
            notes: input.notes.clone(),
            created_by: user_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO delivery_orders (
                id, do_number, beneficiary_id, source_location_id, status,
                scheduled_date, notes, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.do_number)
        .bind(&order.beneficiary_id)
        .bind(&order.source_location_id)
        .bind(order.status)
        .bind(order.scheduled_date)
        .bind(&order.notes)
        .bind(&order.created_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            reserve(
                &mut tx,
                &line.item_id,
                &order.source_location_id,
                line.quantity,
                ReferenceType::DeliveryOrder,
                &order.id,
            )
            .await?;

            let item = DeliveryOrderItem {
                id: new_id(),
                delivery_order_id: order.id.clone(),
                item_id: line.item_id.clone(),
                quantity: line.quantity,
            };
            sqlx::query(
                r#"
                INSERT INTO delivery_order_items (id, delivery_order_id, item_id, quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&item.id)
            .bind(&item.delivery_order_id)
            .bind(&item.item_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        info!(do_number = %order.do_number, lines = items.len(), "Created delivery order");
        Ok(DeliveryOrderDetail { order, items })
    }

    /// Moves PENDING to DISPATCHED; reserved stock leaves the source.
    pub async fn dispatch(
        &self,
        id: &str,
        user_id: Option<&str>,
    ) -> DbResult<(DeliveryOrder, Vec<StockMovement>)> {
        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        check_delivery_order(&order.do_number, order.status, DeliveryOrderStatus::Dispatched)?;

        let posting = Posting::new(MovementType::Dispatch)
            .note(Some(order.do_number.as_str()))
            .by(user_id);
        let movements =
            consume_reservations(&mut tx, ReferenceType::DeliveryOrder, &order.id, posting).await?;

        let now = Utc::now();
        order.status = DeliveryOrderStatus::Dispatched;
        order.dispatched_at = Some(now);
        order.updated_at = now;
        write_status(&mut tx, &order).await?;
        tx.commit().await?;

        info!(do_number = %order.do_number, movements = movements.len(), "Dispatched delivery order");
        Ok((order, movements))
    }

    /// Confirms arrival at the beneficiary.
    pub async fn deliver(&self, id: &str, input: &ConfirmDelivery) -> DbResult<DeliveryOrder> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        check_delivery_order(&order.do_number, order.status, DeliveryOrderStatus::Delivered)?;

        let now = Utc::now();
        order.status = DeliveryOrderStatus::Delivered;
        order.delivered_at = Some(now);
        order.received_by = Some(input.received_by.trim().to_string());
        if input.notes.is_some() {
            order.notes = input.notes.clone();
        }
        order.updated_at = now;
        write_status(&mut tx, &order).await?;
        tx.commit().await?;

        info!(do_number = %order.do_number, received_by = ?order.received_by, "Delivered");
        Ok(order)
    }

    /// Cancels a PENDING order and releases its reservations.
    pub async fn cancel(&self, id: &str) -> DbResult<DeliveryOrder> {
        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        check_delivery_order(&order.do_number, order.status, DeliveryOrderStatus::Cancelled)?;

        let released =
            release_reservations(&mut tx, ReferenceType::DeliveryOrder, &order.id).await?;

        order.status = DeliveryOrderStatus::Cancelled;
        order.updated_at = Utc::now();
        write_status(&mut tx, &order).await?;
        tx.commit().await?;

        debug!(do_number = %order.do_number, released, "Cancelled delivery order");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::stock::StockFilter;
    use crate::repository::test_support::{date, db, item, location, stock};
    use crate::{Database, DbConfig};
    use mbg_core::input::{BeneficiaryInput, DeliveryOrderLineInput};
    use mbg_core::{BeneficiaryType, CoreError, ItemType, LocationType, Stock};

    struct Setup {
        input: DeliveryOrderInput,
        meal_rows: Vec<Stock>,
    }

    /// 100 meals in two batches at a kitchen, one school.
    async fn setup(db: &Database, quantity: f64) -> Setup {
        let kit = location(db, "KIT-1", LocationType::Kitchen).await;
        let meal = item(db, "MEAL", ItemType::FinishedGood, 0).await;
        let later = stock(db, &meal, &kit, 60.0, "WO-B", Some(date(2026, 3, 5))).await;
        let sooner = stock(db, &meal, &kit, 40.0, "WO-A", Some(date(2026, 3, 2))).await;
        let school = db
            .beneficiaries()
            .create(&BeneficiaryInput {
                code: "SDN-01".to_string(),
                name: "SD Negeri 1".to_string(),
                beneficiary_type: BeneficiaryType::School,
                address: None,
                contact_name: None,
                phone: None,
                target_portions: 100,
                location_id: None,
                is_active: true,
            })
            .await
            .unwrap();

        Setup {
            input: DeliveryOrderInput {
                beneficiary_id: school.id,
                source_location_id: kit.id,
                scheduled_date: date(2026, 3, 1),
                notes: None,
                items: vec![DeliveryOrderLineInput {
                    item_id: meal.id,
                    quantity,
                }],
            },
            meal_rows: vec![sooner, later],
        }
    }

    async fn row(db: &Database, id: &str) -> Stock {
        db.stock().get(id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_create_reserves_fefo_and_dispatch_consumes() {
        let db = db().await;
        let s = setup(&db, 70.0).await;

        let order = db.delivery_orders().create(&s.input, None).await.unwrap();
        assert!(order.order.do_number.starts_with("DO-"));
        assert_eq!(row(&db, &s.meal_rows[0].id).await.reserved_quantity, 40.0);
        assert_eq!(row(&db, &s.meal_rows[1].id).await.reserved_quantity, 30.0);

        let (dispatched, movements) =
            db.delivery_orders().dispatch(&order.order.id, None).await.unwrap();
        assert_eq!(dispatched.status, DeliveryOrderStatus::Dispatched);
        assert!(dispatched.dispatched_at.is_some());
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().all(|m| m.movement_type == MovementType::Dispatch));

        let sooner = row(&db, &s.meal_rows[0].id).await;
        assert_eq!(sooner.quantity, 0.0);
        assert_eq!(sooner.reserved_quantity, 0.0);
        let later = row(&db, &s.meal_rows[1].id).await;
        assert_eq!(later.quantity, 30.0);
        assert_eq!(later.reserved_quantity, 0.0);

        let delivered = db
            .delivery_orders()
            .deliver(
                &order.order.id,
                &ConfirmDelivery {
                    received_by: "Ibu Ani".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(delivered.status, DeliveryOrderStatus::Delivered);
        assert_eq!(delivered.received_by.as_deref(), Some("Ibu Ani"));
    }

    #[tokio::test]
    async fn test_over_reservation_fails_cleanly() {
        let db = db().await;
        let s = setup(&db, 101.0).await;

        let err = db.delivery_orders().create(&s.input, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available, requested, .. })
                if available == 100.0 && requested == 101.0
        ));

        let all = db.stock().list(&StockFilter::default()).await.unwrap();
        assert!(all.items.iter().all(|v| v.stock.reserved_quantity == 0.0));
        let orders = db.delivery_orders().list(&DeliveryOrderFilter::default()).await.unwrap();
        assert_eq!(orders.pagination.total, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_orders_cannot_over_reserve() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("mbg.db").display());
        let db = Database::new(DbConfig::new(url).max_connections(4)).await.unwrap();
        // 60 of 100 each: only one of the two fits
        let s = setup(&db, 60.0).await;

        let orders = db.delivery_orders();
        let (first, second) = tokio::join!(orders.create(&s.input, None), orders.create(&s.input, None));
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(DbError::Core(CoreError::InsufficientStock { available, .. })) if *available == 40.0
        )));

        let all = db.stock().list(&StockFilter::default()).await.unwrap();
        assert!(all
            .items
            .iter()
            .all(|v| v.stock.reserved_quantity <= v.stock.quantity));
        let reserved: f64 = all.items.iter().map(|v| v.stock.reserved_quantity).sum();
        assert_eq!(reserved, 60.0);

        db.close().await;
    }

    #[tokio::test]
    async fn test_cancel_only_while_pending() {
        let db = db().await;
        let s = setup(&db, 50.0).await;

        let first = db.delivery_orders().create(&s.input, None).await.unwrap();
        db.delivery_orders().cancel(&first.order.id).await.unwrap();
        assert_eq!(row(&db, &s.meal_rows[0].id).await.reserved_quantity, 0.0);

        let second = db.delivery_orders().create(&s.input, None).await.unwrap();
        db.delivery_orders().dispatch(&second.order.id, None).await.unwrap();
        assert!(matches!(
            db.delivery_orders().cancel(&second.order.id).await,
            Err(DbError::Core(CoreError::InvalidStatusTransition { .. }))
        ));
    }
}
