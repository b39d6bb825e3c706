//! # Work Order Repository
//!
//! Production runs at a kitchen.
//!
//! ## Lifecycle and Stock Effects
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PLANNED ──start──► IN_PROGRESS ──complete──► COMPLETED                │
//! │     │                   │                                               │
//! │     │                   │   start:    reserve scaled ingredients       │
//! │     │                   │             at the kitchen (FEFO)            │
//! │     │                   │   complete: consume reservations             │
//! │     │                   │             (PRODUCTION_OUT), credit output  │
//! │     │                   │             item (PRODUCTION_IN), batch =    │
//! │     │                   │             WO number                        │
//! │     └──cancel──┐   ┌────┘                                              │
//! │                ▼   ▼     cancel: release reservations                   │
//! │              CANCELLED                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each transition is a single transaction, so a shortage on any one
//! ingredient leaves every stock row untouched.

use chrono::{NaiveDate, Utc};
use mbg_core::input::{CompleteWorkOrder, WorkOrderInput};
use mbg_core::status::check_work_order;
use mbg_core::validation::add_days;
use mbg_core::{
    MovementType, Page, PageRequest, QUANTITY_EPSILON, ReferenceType, StockMovement,
    WorkOrder, WorkOrderDetail, WorkOrderStatus,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::recipe::{fetch_recipe, scale_detail};
use super::sequence::{next_number, DocumentKind};
use super::stock::{consume_reservations, credit, release_reservations, reserve, Posting};
use super::{begin_posting, ensure_exists, like_pattern, new_id};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilter {
    pub page: PageRequest,
    /// Matches the WO number.
    pub search: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub kitchen_location_id: Option<String>,
    /// Inclusive bounds on `scheduled_date`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<WorkOrder> {
    sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Work order", id))
}

async fn write_status(conn: &mut SqliteConnection, order: &WorkOrder) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE work_orders SET
            status = ?2, started_at = ?3, completed_at = ?4,
            produced_quantity = ?5, notes = ?6, updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(order.status)
    .bind(order.started_at)
    .bind(order.completed_at)
    .bind(order.produced_quantity)
    .bind(&order.notes)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct WorkOrderRepository {
    pool: SqlitePool,
}

impl WorkOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WorkOrderRepository { pool }
    }

    pub async fn list(&self, filter: &WorkOrderFilter) -> DbResult<Page<WorkOrder>> {
        let pattern = like_pattern(filter.search.as_deref());
        const WHERE: &str = r#"
            FROM work_orders
            WHERE (?1 IS NULL OR wo_number LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR kitchen_location_id = ?3)
              AND (?4 IS NULL OR scheduled_date >= ?4)
              AND (?5 IS NULL OR scheduled_date <= ?5)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {WHERE}"))
            .bind(&pattern)
            .bind(filter.status)
            .bind(&filter.kitchen_location_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, WorkOrder>(&format!(
            "SELECT * {WHERE} ORDER BY scheduled_date DESC, created_at DESC LIMIT ?6 OFFSET ?7"
        ))
        .bind(&pattern)
        .bind(filter.status)
        .bind(&filter.kitchen_location_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.page.limit())
        .bind(filter.page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows, filter.page, total))
    }

    /// The order plus its ingredient requirements at the planned quantity.
    pub async fn get(&self, id: &str) -> DbResult<WorkOrderDetail> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        let recipe = fetch_recipe(&mut conn, &order.recipe_id).await?;
        let scaled = scale_detail(&mut conn, &recipe, order.planned_quantity).await?;
        Ok(WorkOrderDetail {
            order,
            requirements: scaled.ingredients,
        })
    }

    /// Plans a run. The estimated cost is fixed at creation from current
    /// item prices.
    pub async fn create(&self, input: &WorkOrderInput, user_id: Option<&str>) -> DbResult<WorkOrderDetail> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        ensure_exists(&mut tx, "locations", "Location", &input.kitchen_location_id).await?;
        let recipe = fetch_recipe(&mut tx, &input.recipe_id).await?;
        let scaled = scale_detail(&mut tx, &recipe, input.planned_quantity).await?;

        let now = Utc::now();
        let order = WorkOrder {
            id: new_id(),
            wo_number: next_number(&mut tx, DocumentKind::WorkOrder, now.date_naive()).await?,
            recipe_id: recipe.recipe.id.clone(),
            kitchen_location_id: input.kitchen_location_id.clone(),
            planned_quantity: input.planned_quantity,
            produced_quantity: None,
            status: WorkOrderStatus::Planned,
            scheduled_date: input.scheduled_date,
            started_at: None,
            completed_at: None,
            estimated_cost_cents: scaled.total_cost_cents,
            notes: input.notes.clone(),
            created_by: user_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO work_orders (
                id, wo_number, recipe_id, kitchen_location_id, planned_quantity,
                status, scheduled_date, estimated_cost_cents, notes, created_by,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.wo_number)
        .bind(&order.recipe_id)
        .bind(&order.kitchen_location_id)
        .bind(order.planned_quantity)
        .bind(order.status)
        .bind(order.scheduled_date)
        .bind(order.estimated_cost_cents)
        .bind(&order.notes)
        .bind(&order.created_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            wo_number = %order.wo_number,
            recipe = %recipe.recipe.code,
            planned = order.planned_quantity,
            "Created work order"
        );
        Ok(WorkOrderDetail {
            order,
            requirements: scaled.ingredients,
        })
    }

    /// Moves PLANNED to IN_PROGRESS and reserves every scaled ingredient at
    /// the kitchen.
    ///
    /// ## Errors
    /// `InsufficientStock` naming the first short ingredient; nothing is
    /// reserved in that case.
    pub async fn start(&self, id: &str) -> DbResult<WorkOrder> {
        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        check_work_order(&order.wo_number, order.status, WorkOrderStatus::InProgress)?;

        let recipe = fetch_recipe(&mut tx, &order.recipe_id).await?;
        let scaled = scale_detail(&mut tx, &recipe, order.planned_quantity).await?;
        for ingredient in &scaled.ingredients {
            reserve(
                &mut tx,
                &ingredient.item_id,
                &order.kitchen_location_id,
                ingredient.quantity,
                ReferenceType::WorkOrder,
                &order.id,
            )
            .await?;
        }

        let now = Utc::now();
        order.status = WorkOrderStatus::InProgress;
        order.started_at = Some(now);
        order.updated_at = now;
        write_status(&mut tx, &order).await?;
        tx.commit().await?;

        info!(wo_number = %order.wo_number, ingredients = scaled.ingredients.len(), "Started work order");
        Ok(order)
    }

    /// Moves IN_PROGRESS to COMPLETED: consumes the reserved ingredients and
    /// credits the output item at the kitchen.
    ///
    /// The output batch is the WO number; its expiry is the scheduled date
    /// plus the output item's shelf life, when it has one.
    pub async fn complete(
        &self,
        id: &str,
        input: &CompleteWorkOrder,
        user_id: Option<&str>,
    ) -> DbResult<(WorkOrder, Vec<StockMovement>)> {
        input.validate()?;

        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        check_work_order(&order.wo_number, order.status, WorkOrderStatus::Completed)?;

        let recipe = fetch_recipe(&mut tx, &order.recipe_id).await?;
        let output = sqlx::query_as::<_, mbg_core::Item>("SELECT * FROM items WHERE id = ?1")
            .bind(&recipe.recipe.output_item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Item", &recipe.recipe.output_item_id))?;

        let posting = Posting::new(MovementType::ProductionOut)
            .note(Some(order.wo_number.as_str()))
            .by(user_id);
        let mut movements =
            consume_reservations(&mut tx, ReferenceType::WorkOrder, &order.id, posting).await?;

        let produced = input.produced_quantity.unwrap_or(order.planned_quantity);
        if produced > QUANTITY_EPSILON {
            let expiry = output
                .shelf_life_days
                .map(|days| add_days("shelfLifeDays", order.scheduled_date, days))
                .transpose()?;
            let (_, movement) = credit(
                &mut tx,
                &output.id,
                &order.kitchen_location_id,
                &order.wo_number,
                expiry,
                produced,
                Posting::new(MovementType::ProductionIn)
                    .reference(ReferenceType::WorkOrder, &order.id)
                    .note(Some(order.wo_number.as_str()))
                    .by(user_id),
            )
            .await?;
            movements.push(movement);
        }

        let now = Utc::now();
        order.status = WorkOrderStatus::Completed;
        order.produced_quantity = Some(produced);
        order.completed_at = Some(now);
        order.updated_at = now;
        if input.notes.is_some() {
            order.notes = input.notes.clone();
        }
        write_status(&mut tx, &order).await?;
        tx.commit().await?;

        info!(
            wo_number = %order.wo_number,
            produced,
            movements = movements.len(),
            "Completed work order"
        );
        Ok((order, movements))
    }

    /// Cancels a PLANNED or IN_PROGRESS order, releasing any reservations.
    pub async fn cancel(&self, id: &str) -> DbResult<WorkOrder> {
        let mut tx = begin_posting(&self.pool).await?;
        let mut order = fetch_order(&mut tx, id).await?;
        check_work_order(&order.wo_number, order.status, WorkOrderStatus::Cancelled)?;

        let released = release_reservations(&mut tx, ReferenceType::WorkOrder, &order.id).await?;

        order.status = WorkOrderStatus::Cancelled;
        order.updated_at = Utc::now();
        write_status(&mut tx, &order).await?;
        tx.commit().await?;

        debug!(wo_number = %order.wo_number, released, "Cancelled work order");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::stock::StockFilter;
    use crate::repository::test_support::{date, db, location, nasi_ayam};
    use crate::Database;
    use mbg_core::input::NewStock;
    use mbg_core::{CoreError, LocationType, Stock};

    struct Kitchen {
        location_id: String,
        recipe_id: String,
        rice: String,
        chicken: String,
        meal: String,
    }

    async fn kitchen(db: &Database, rice_kg: f64, chicken_kg: f64) -> Kitchen {
        let kit = location(db, "KIT-1", LocationType::Kitchen).await;
        let input = nasi_ayam(db).await;
        let recipe = db.recipes().create(&input).await.unwrap();
        let (rice, chicken) = (input.items[0].item_id.clone(), input.items[1].item_id.clone());

        for (item_id, quantity) in [(&rice, rice_kg), (&chicken, chicken_kg)] {
            db.stock()
                .create(
                    &NewStock {
                        item_id: item_id.clone(),
                        location_id: kit.id.clone(),
                        quantity,
                        batch_number: String::new(),
                        expiry_date: None,
                    },
                    None,
                )
                .await
                .unwrap();
        }

        Kitchen {
            location_id: kit.id,
            recipe_id: recipe.recipe.id,
            rice,
            chicken,
            meal: input.output_item_id,
        }
    }

    async fn plan(db: &Database, k: &Kitchen, quantity: f64) -> WorkOrderDetail {
        db.work_orders()
            .create(
                &WorkOrderInput {
                    recipe_id: k.recipe_id.clone(),
                    kitchen_location_id: k.location_id.clone(),
                    planned_quantity: quantity,
                    scheduled_date: date(2026, 3, 1),
                    notes: None,
                },
                None,
            )
            .await
            .unwrap()
    }

    async fn rows(db: &Database, item_id: &str) -> Vec<Stock> {
        db.stock()
            .list(&StockFilter {
                item_id: Some(item_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|v| v.stock)
            .collect()
    }

    #[tokio::test]
    async fn test_full_production_run() {
        let db = db().await;
        let k = kitchen(&db, 50.0, 40.0).await;

        let planned = plan(&db, &k, 250.0).await;
        assert!(planned.order.wo_number.starts_with("WO-"));
        assert_eq!(planned.order.estimated_cost_cents, 24_000 + 52_500);
        assert_eq!(planned.requirements[0].quantity, 20.0);

        let started = db.work_orders().start(&planned.order.id).await.unwrap();
        assert_eq!(started.status, WorkOrderStatus::InProgress);
        assert_eq!(rows(&db, &k.rice).await[0].reserved_quantity, 20.0);

        let (done, movements) = db
            .work_orders()
            .complete(&planned.order.id, &CompleteWorkOrder::default(), None)
            .await
            .unwrap();
        assert_eq!(done.status, WorkOrderStatus::Completed);
        assert_eq!(done.produced_quantity, Some(250.0));
        assert_eq!(movements.len(), 3);

        let rice = &rows(&db, &k.rice).await[0];
        assert_eq!(rice.quantity, 30.0);
        assert_eq!(rice.reserved_quantity, 0.0);
        assert_eq!(rows(&db, &k.chicken).await[0].quantity, 25.0);

        let meal = &rows(&db, &k.meal).await[0];
        assert_eq!(meal.quantity, 250.0);
        assert_eq!(meal.batch_number, done.wo_number);
        assert_eq!(meal.expiry_date, Some(date(2026, 3, 3)));
    }

    #[tokio::test]
    async fn test_complete_with_unusable_shelf_life_rolls_back() {
        let db = db().await;
        let k = kitchen(&db, 50.0, 40.0).await;
        let planned = plan(&db, &k, 250.0).await;
        db.work_orders().start(&planned.order.id).await.unwrap();

        // written before shelf life was bounded on input
        sqlx::query("UPDATE items SET shelf_life_days = 100000000 WHERE id = ?1")
            .bind(&k.meal)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .work_orders()
            .complete(&planned.order.id, &CompleteWorkOrder::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(mbg_core::ValidationError::OutOfRange { ref field, .. }))
                if field == "shelfLifeDays"
        ));

        let rice = &rows(&db, &k.rice).await[0];
        assert_eq!(rice.quantity, 50.0);
        assert_eq!(rice.reserved_quantity, 20.0);
        assert!(rows(&db, &k.meal).await.is_empty());
        let order = db.work_orders().get(&planned.order.id).await.unwrap();
        assert_eq!(order.order.status, WorkOrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_start_with_shortage_reserves_nothing() {
        let db = db().await;
        // Rice covers 250 portions, chicken only 100.
        let k = kitchen(&db, 50.0, 6.0).await;
        let planned = plan(&db, &k, 250.0).await;

        let err = db.work_orders().start(&planned.order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { ref item, .. }) if item == "CHICKEN"
        ));

        assert_eq!(rows(&db, &k.rice).await[0].reserved_quantity, 0.0);
        let order = db.work_orders().get(&planned.order.id).await.unwrap();
        assert_eq!(order.order.status, WorkOrderStatus::Planned);
    }

    #[tokio::test]
    async fn test_cancel_releases_reservations() {
        let db = db().await;
        let k = kitchen(&db, 50.0, 40.0).await;
        let planned = plan(&db, &k, 100.0).await;
        db.work_orders().start(&planned.order.id).await.unwrap();

        let cancelled = db.work_orders().cancel(&planned.order.id).await.unwrap();
        assert_eq!(cancelled.status, WorkOrderStatus::Cancelled);
        assert_eq!(rows(&db, &k.rice).await[0].reserved_quantity, 0.0);
        assert_eq!(rows(&db, &k.rice).await[0].quantity, 50.0);

        assert!(matches!(
            db.work_orders()
                .complete(&planned.order.id, &CompleteWorkOrder::default(), None)
                .await,
            Err(DbError::Core(CoreError::InvalidStatusTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_complete_requires_start() {
        let db = db().await;
        let k = kitchen(&db, 50.0, 40.0).await;
        let planned = plan(&db, &k, 100.0).await;

        assert!(matches!(
            db.work_orders()
                .complete(&planned.order.id, &CompleteWorkOrder::default(), None)
                .await,
            Err(DbError::Core(CoreError::InvalidStatusTransition { .. }))
        ));

        let filtered = db
            .work_orders()
            .list(&WorkOrderFilter {
                status: Some(WorkOrderStatus::Planned),
                from: Some(date(2026, 3, 1)),
                to: Some(date(2026, 3, 1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.pagination.total, 1);
    }
}
