//! # Route Handlers
//!
//! One module per resource. Every handler follows the same shape:
//!
//! ```text
//! extract (AuthUser, Path, ApiQuery, ApiJson)
//!      │
//!      ▼
//! auth.require(ROLES)?          ← ADMIN always passes
//!      │
//!      ▼
//! state.db.<repository>().<op>(..).await?
//!      │
//!      ▼
//! ok / created / page / message  ← success envelope
//! ```
//!
//! Any authenticated, approved user may read. Writes are guarded with the
//! role sets below.

pub mod auth;
pub mod beneficiaries;
pub mod categories;
pub mod delivery_orders;
pub mod goods_receipts;
pub mod items;
pub mod locations;
pub mod purchase_orders;
pub mod recipes;
pub mod reporting;
pub mod stock;
pub mod suppliers;
pub mod users;
pub mod work_orders;

use axum::Router;
use mbg_core::Role;

use crate::SharedState;

/// Master data, stock and procurement.
pub(crate) const WAREHOUSE: &[Role] = &[Role::WarehouseStaff];

/// Recipes and work orders.
pub(crate) const KITCHEN: &[Role] = &[Role::KitchenStaff];

/// Beneficiaries and delivery orders.
pub(crate) const DISTRIBUTION: &[Role] = &[Role::DistributionStaff];

/// Confirming a delivery at the receiving end.
pub(crate) const DELIVERY_CONFIRMATION: &[Role] =
    &[Role::DistributionStaff, Role::BeneficiaryPoint];

/// All `/api` routes.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(categories::router())
        .merge(locations::router())
        .merge(items::router())
        .merge(stock::router())
        .merge(suppliers::router())
        .merge(purchase_orders::router())
        .merge(goods_receipts::router())
        .merge(recipes::router())
        .merge(work_orders::router())
        .merge(beneficiaries::router())
        .merge(delivery_orders::router())
        .merge(reporting::router())
}
