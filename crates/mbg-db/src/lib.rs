//! # mbg-db: Database Layer for the MBG Inventory System
//!
//! SQLite persistence for the MBG backend, built on sqlx. Every stock
//! movement the system performs is written here, inside a transaction,
//! next to the document change that caused it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MBG Inventory Data Flow                          │
//! │                                                                         │
//! │  axum handler (POST /api/work-orders/{id}/complete)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mbg-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ master data   │    │  (embedded)  │  │   │
//! │  │   │               │    │ documents     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ stock ledger  │    │ 001_init.sql │  │   │
//! │  │   │ WAL + FKs     │    │ reporting     │    │ ...          │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (DATABASE_URL)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and repository accessors
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and constraint mapping
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mbg_db::{Database, DbConfig, ListQuery};
//!
//! let db = Database::new(DbConfig::new("sqlite://mbg.db")).await?;
//!
//! let items = db.items().list(&ListQuery::default(), &Default::default()).await?;
//! let (order, movements) = db.work_orders().complete(&id, &input, user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DEFAULT_DATABASE_URL};
pub use repository::{new_id, ListQuery};

// Repository re-exports for convenience
pub use repository::beneficiary::BeneficiaryRepository;
pub use repository::category::CategoryRepository;
pub use repository::delivery_order::{DeliveryOrderFilter, DeliveryOrderRepository};
pub use repository::goods_receipt::{GoodsReceiptFilter, GoodsReceiptRepository};
pub use repository::item::{ItemFilter, ItemRepository};
pub use repository::location::LocationRepository;
pub use repository::purchase_order::{PurchaseOrderFilter, PurchaseOrderRepository};
pub use repository::recipe::RecipeRepository;
pub use repository::reporting::{
    DashboardSummary, DistributionReport, ExpiringStock, ProductionReport, ReportingRepository,
    EXPIRY_WARNING_DAYS,
};
pub use repository::stock::{MovementFilter, StockFilter, StockRepository};
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
pub use repository::work_order::{WorkOrderFilter, WorkOrderRepository};
