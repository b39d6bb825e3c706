//! # Reporting Repository
//!
//! Read-only aggregates for the dashboard and operational reports.
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────────────────────────┐
//! │ dashboard()        │ counts, low stock, expiring soon, open documents │
//! │ low_stock()        │ items whose available < reorder point            │
//! │ expiring(days)     │ batches expiring within `days` (or expired)      │
//! │ production(range)  │ work orders grouped by recipe                    │
//! │ distribution(range)│ delivery orders grouped by beneficiary           │
//! └────────────────────┴──────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate, Utc};
use mbg_core::stock::StockSummary;
use mbg_core::validation::add_days;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::stock::StockRepository;
use crate::error::DbResult;

/// Days ahead the dashboard counts as "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 7;

// =============================================================================
// Report Rows
// =============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub total_items: i64,
    pub total_locations: i64,
    pub low_stock_items: i64,
    pub expiring_batches: i64,
    pub open_purchase_orders: i64,
    pub work_orders_planned: i64,
    pub work_orders_in_progress: i64,
    pub delivery_orders_pending: i64,
    pub delivery_orders_dispatched: i64,
    /// On-hand quantity valued at standard item prices.
    pub stock_value_cents: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpiringStock {
    pub stock_id: String,
    pub item_id: String,
    pub sku: String,
    pub item_name: String,
    pub location_id: String,
    pub location_name: String,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: f64,
    /// Negative once expired.
    #[sqlx(skip)]
    pub days_until_expiry: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductionReport {
    pub recipe_id: String,
    pub recipe_code: String,
    pub recipe_name: String,
    pub work_orders: i64,
    pub completed: i64,
    pub planned_quantity: f64,
    pub produced_quantity: f64,
    pub estimated_cost_cents: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DistributionReport {
    pub beneficiary_id: String,
    pub beneficiary_code: String,
    pub beneficiary_name: String,
    pub delivery_orders: i64,
    pub delivered: i64,
    /// Sum of line quantities across non-cancelled orders.
    pub total_quantity: f64,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReportingRepository {
    pool: SqlitePool,
}

impl ReportingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportingRepository { pool }
    }

    async fn count(&self, sql: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn dashboard(&self) -> DbResult<DashboardSummary> {
        let today = Utc::now().date_naive();
        let low_stock_items = self.low_stock().await?.len() as i64;

        let expiring_batches: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM stocks
            WHERE quantity > 0 AND expiry_date IS NOT NULL AND expiry_date <= ?1
            "#,
        )
        .bind(today + Duration::days(EXPIRY_WARNING_DAYS))
        .fetch_one(&self.pool)
        .await?;

        let stock_value_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(ROUND(TOTAL(s.quantity * i.price_cents)) AS INTEGER)
            FROM stocks s JOIN items i ON i.id = s.item_id
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            total_items: self.count("SELECT COUNT(*) FROM items WHERE is_active = 1").await?,
            total_locations: self.count("SELECT COUNT(*) FROM locations WHERE is_active = 1").await?,
            low_stock_items,
            expiring_batches,
            open_purchase_orders: self
                .count("SELECT COUNT(*) FROM purchase_orders WHERE status IN ('SUBMITTED', 'PARTIALLY_RECEIVED')")
                .await?,
            work_orders_planned: self
                .count("SELECT COUNT(*) FROM work_orders WHERE status = 'PLANNED'")
                .await?,
            work_orders_in_progress: self
                .count("SELECT COUNT(*) FROM work_orders WHERE status = 'IN_PROGRESS'")
                .await?,
            delivery_orders_pending: self
                .count("SELECT COUNT(*) FROM delivery_orders WHERE status = 'PENDING'")
                .await?,
            delivery_orders_dispatched: self
                .count("SELECT COUNT(*) FROM delivery_orders WHERE status = 'DISPATCHED'")
                .await?,
            stock_value_cents,
        })
    }

    /// Active items whose total available quantity is below their reorder
    /// point.
    pub async fn low_stock(&self) -> DbResult<Vec<StockSummary>> {
        let summary = StockRepository::new(self.pool.clone()).summary(None).await?;
        Ok(summary.into_iter().filter(|s| s.below_reorder_point).collect())
    }

    /// Batches with stock on hand expiring within `days` from today,
    /// including already expired ones, soonest first.
    pub async fn expiring(&self, days: i64) -> DbResult<Vec<ExpiringStock>> {
        let today = Utc::now().date_naive();
        let horizon = add_days("days", today, days.max(0))?;
        let mut rows = sqlx::query_as::<_, ExpiringStock>(
            r#"
            SELECT s.id AS stock_id, s.item_id, i.sku, i.name AS item_name,
                   s.location_id, l.name AS location_name, s.batch_number,
                   s.expiry_date, s.quantity
            FROM stocks s
            JOIN items i ON i.id = s.item_id
            JOIN locations l ON l.id = s.location_id
            WHERE s.quantity > 0 AND s.expiry_date IS NOT NULL AND s.expiry_date <= ?1
            ORDER BY s.expiry_date, i.name
            "#,
        )
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;

        for row in &mut rows {
            row.days_until_expiry = (row.expiry_date - today).num_days();
        }
        Ok(rows)
    }

    /// Non-cancelled work orders scheduled in `[from, to]`, per recipe.
    pub async fn production(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<ProductionReport>> {
        let rows = sqlx::query_as::<_, ProductionReport>(
            r#"
            SELECT r.id AS recipe_id, r.code AS recipe_code, r.name AS recipe_name,
                   COUNT(*) AS work_orders,
                   SUM(CASE WHEN w.status = 'COMPLETED' THEN 1 ELSE 0 END) AS completed,
                   TOTAL(w.planned_quantity) AS planned_quantity,
                   TOTAL(w.produced_quantity) AS produced_quantity,
                   SUM(w.estimated_cost_cents) AS estimated_cost_cents
            FROM work_orders w
            JOIN recipes r ON r.id = w.recipe_id
            WHERE w.status != 'CANCELLED'
              AND (?1 IS NULL OR w.scheduled_date >= ?1)
              AND (?2 IS NULL OR w.scheduled_date <= ?2)
            GROUP BY r.id, r.code, r.name
            ORDER BY r.name
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Non-cancelled delivery orders scheduled in `[from, to]`, per
    /// beneficiary.
    pub async fn distribution(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<DistributionReport>> {
        let rows = sqlx::query_as::<_, DistributionReport>(
            r#"
            SELECT b.id AS beneficiary_id, b.code AS beneficiary_code,
                   b.name AS beneficiary_name,
                   COUNT(DISTINCT d.id) AS delivery_orders,
                   COUNT(DISTINCT CASE WHEN d.status = 'DELIVERED' THEN d.id END) AS delivered,
                   TOTAL(i.quantity) AS total_quantity
            FROM delivery_orders d
            JOIN beneficiaries b ON b.id = d.beneficiary_id
            LEFT JOIN delivery_order_items i ON i.delivery_order_id = d.id
            WHERE d.status != 'CANCELLED'
              AND (?1 IS NULL OR d.scheduled_date >= ?1)
              AND (?2 IS NULL OR d.scheduled_date <= ?2)
            GROUP BY b.id, b.code, b.name
            ORDER BY b.name
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, db, item, location, nasi_ayam, stock};
    use mbg_core::input::WorkOrderInput;
    use mbg_core::{ItemType, LocationType};

    #[tokio::test]
    async fn test_dashboard_on_empty_database() {
        let db = db().await;
        let dashboard = db.reporting().dashboard().await.unwrap();
        assert_eq!(dashboard.total_items, 0);
        assert_eq!(dashboard.stock_value_cents, 0);
        assert_eq!(dashboard.open_purchase_orders, 0);
    }

    #[tokio::test]
    async fn test_low_stock_and_value() {
        let db = db().await;
        let wh = location(&db, "WH-1", LocationType::CentralWarehouse).await;
        // Reorder point is 5 for fixture items.
        let rice = item(&db, "RICE", ItemType::RawMaterial, 1_200).await;
        let oil = item(&db, "OIL", ItemType::RawMaterial, 2_000).await;
        stock(&db, &rice, &wh, 3.0, "", None).await;
        stock(&db, &oil, &wh, 10.0, "", None).await;

        let low = db.reporting().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "RICE");

        let dashboard = db.reporting().dashboard().await.unwrap();
        assert_eq!(dashboard.total_items, 2);
        assert_eq!(dashboard.low_stock_items, 1);
        assert_eq!(dashboard.stock_value_cents, 3_600 + 20_000);
    }

    #[tokio::test]
    async fn test_expiring_window() {
        let db = db().await;
        let wh = location(&db, "WH-1", LocationType::CentralWarehouse).await;
        let milk = item(&db, "MILK", ItemType::RawMaterial, 500).await;
        let today = Utc::now().date_naive();
        stock(&db, &milk, &wh, 5.0, "B-OLD", Some(today - Duration::days(1))).await;
        stock(&db, &milk, &wh, 5.0, "B-SOON", Some(today + Duration::days(3))).await;
        stock(&db, &milk, &wh, 5.0, "B-LATE", Some(today + Duration::days(30))).await;

        let rows = db.reporting().expiring(7).await.unwrap();
        let batches: Vec<_> = rows.iter().map(|r| r.batch_number.as_str()).collect();
        assert_eq!(batches, vec!["B-OLD", "B-SOON"]);
        assert_eq!(rows[0].days_until_expiry, -1);
        assert_eq!(rows[1].days_until_expiry, 3);

        let dashboard = db.reporting().dashboard().await.unwrap();
        assert_eq!(dashboard.expiring_batches, 2);

        let all = db.reporting().expiring(mbg_core::validation::MAX_DAYS).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(matches!(
            db.reporting().expiring(100_000_000).await,
            Err(crate::DbError::Core(mbg_core::CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_production_groups_by_recipe() {
        let db = db().await;
        let kit = location(&db, "KIT-1", LocationType::Kitchen).await;
        let recipe = db.recipes().create(&nasi_ayam(&db).await).await.unwrap();

        for (day, quantity) in [(1, 100.0), (2, 150.0), (20, 500.0)] {
            db.work_orders()
                .create(
                    &WorkOrderInput {
                        recipe_id: recipe.recipe.id.clone(),
                        kitchen_location_id: kit.id.clone(),
                        planned_quantity: quantity,
                        scheduled_date: date(2026, 3, day),
                        notes: None,
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let report = db
            .reporting()
            .production(Some(date(2026, 3, 1)), Some(date(2026, 3, 7)))
            .await
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].work_orders, 2);
        assert_eq!(report[0].completed, 0);
        assert_eq!(report[0].planned_quantity, 250.0);
        assert_eq!(report[0].produced_quantity, 0.0);

        let distribution = db.reporting().distribution(None, None).await.unwrap();
        assert!(distribution.is_empty());
    }
}
