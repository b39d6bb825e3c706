//! # Domain Types
//!
//! Core domain types used throughout the MBG inventory system.
//!
//! ## Supply Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │   Supplier ──► PurchaseOrder ──► GoodsReceipt ──┐                      │
//! │                                                  │ RECEIPT              │
//! │                                                  ▼                      │
//! │   Item ◄──── Stock (item, location, batch) ◄── StockMovement           │
//! │    ▲             │              ▲                                       │
//! │    │ output      │ ingredients  │ PRODUCTION_IN / PRODUCTION_OUT        │
//! │    │             ▼              │                                       │
//! │   Recipe ─────► WorkOrder ──────┘                                       │
//! │                                                                         │
//! │   Beneficiary ◄── DeliveryOrder ── DISPATCH ──► Stock                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - `id`: UUID v4 string, immutable, used for relations
//! - Business identifiers (sku, code, po_number...) are human-readable and unique
//! - Quantities are `f64` in the item's unit, money is integer minor units
//! - JSON uses camelCase field names, enums use SCREAMING_SNAKE_CASE

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enumerations
// =============================================================================

/// Declares a string-backed domain enum.
///
/// Every status / kind column is stored as TEXT in SCREAMING_SNAKE_CASE and
/// travels over JSON the same way, so the serde and sqlx renames must agree.
macro_rules! domain_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[ts(export)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored / wire representation.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(crate::error::ValidationError::InvalidFormat {
                        field: stringify!($name).to_string(),
                        reason: format!("unknown value '{}'", s),
                    }),
                }
            }
        }
    };
}

domain_enum! {
    /// Access role of a user account.
    pub enum Role {
        /// Full access, approves new accounts.
        Admin => "ADMIN",
        /// Receives goods, adjusts and transfers stock.
        WarehouseStaff => "WAREHOUSE_STAFF",
        /// Maintains recipes and runs work orders.
        KitchenStaff => "KITCHEN_STAFF",
        /// Creates and dispatches delivery orders.
        DistributionStaff => "DISTRIBUTION_STAFF",
        /// Confirms receipt at a school / health post.
        BeneficiaryPoint => "BENEFICIARY_POINT",
    }
}

domain_enum! {
    /// Whether an item is bought in or produced.
    pub enum ItemType {
        RawMaterial => "RAW_MATERIAL",
        FinishedGood => "FINISHED_GOOD",
    }
}

domain_enum! {
    /// Physical role of a location in the supply chain.
    pub enum LocationType {
        CentralWarehouse => "CENTRAL_WAREHOUSE",
        Kitchen => "KITCHEN",
        DistributionPoint => "DISTRIBUTION_POINT",
        RegionalWarehouse => "REGIONAL_WAREHOUSE",
    }
}

domain_enum! {
    /// Kind of recipient receiving deliveries.
    pub enum BeneficiaryType {
        School => "SCHOOL",
        HealthPost => "HEALTH_POST",
        Community => "COMMUNITY",
        Other => "OTHER",
    }
}

domain_enum! {
    /// Purchase order lifecycle.
    pub enum PurchaseOrderStatus {
        Draft => "DRAFT",
        Submitted => "SUBMITTED",
        PartiallyReceived => "PARTIALLY_RECEIVED",
        Received => "RECEIVED",
        Cancelled => "CANCELLED",
    }
}

domain_enum! {
    /// Work order lifecycle.
    pub enum WorkOrderStatus {
        Planned => "PLANNED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

domain_enum! {
    /// Delivery order lifecycle.
    pub enum DeliveryOrderStatus {
        Pending => "PENDING",
        Dispatched => "DISPATCHED",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
    }
}

domain_enum! {
    /// Cause of a stock movement. Quantities on movements are signed.
    pub enum MovementType {
        /// Goods receipt against a purchase order (+).
        Receipt => "RECEIPT",
        /// Manual issue out of stock (-).
        Issue => "ISSUE",
        /// Manual correction (+/-).
        Adjustment => "ADJUSTMENT",
        TransferIn => "TRANSFER_IN",
        TransferOut => "TRANSFER_OUT",
        /// Finished good credited by a completed work order (+).
        ProductionIn => "PRODUCTION_IN",
        /// Ingredient consumed by a completed work order (-).
        ProductionOut => "PRODUCTION_OUT",
        /// Delivery order leaving its source location (-).
        Dispatch => "DISPATCH",
    }
}

domain_enum! {
    /// Document type that a reservation or movement points back to.
    pub enum ReferenceType {
        PurchaseOrder => "PURCHASE_ORDER",
        GoodsReceipt => "GOODS_RECEIPT",
        WorkOrder => "WORK_ORDER",
        DeliveryOrder => "DELIVERY_ORDER",
        Manual => "MANUAL",
    }
}

// =============================================================================
// Users & Master Data
// =============================================================================

/// An account that can sign in to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    /// New registrations wait for an admin before they can sign in.
    pub is_approved: bool,
    pub is_active: bool,
    /// Home location for kitchen / distribution staff.
    pub location_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may obtain tokens.
    pub fn can_sign_in(&self) -> bool {
        self.is_approved && self.is_active
    }
}

/// Item grouping (grains, protein, vegetables, packaged meals...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A warehouse, kitchen or distribution point that holds stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Location {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub address: Option<String>,
    pub capacity_kg: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stock-keeping unit: a raw material or a finished good.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    pub id: String,
    /// Stock Keeping Unit, unique.
    pub sku: String,
    /// Short internal code, unique.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    /// Unit of measure (kg, l, pcs, portion).
    pub unit: String,
    pub category_id: Option<String>,
    /// Available quantity at or below which the item shows as low stock.
    pub reorder_point: f64,
    /// Standard price per unit in minor units.
    pub price_cents: i64,
    /// Used to derive expiry dates for produced batches.
    pub shelf_life_days: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn is_raw_material(&self) -> bool {
        self.item_type == ItemType::RawMaterial
    }

    #[inline]
    pub fn is_finished_good(&self) -> bool {
        self.item_type == ItemType::FinishedGood
    }
}

/// A food-program supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub code: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A school, health post or community group receiving meals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Beneficiary {
    pub id: String,
    pub code: String,
    pub name: String,
    pub beneficiary_type: BeneficiaryType,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    /// Portions expected per delivery day.
    pub target_portions: i64,
    /// Distribution point serving this beneficiary.
    pub location_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock
// =============================================================================

/// On-hand quantity of one item at one location, per batch.
///
/// ## Identity
/// Unique on `(item_id, location_id, batch_number)`. An empty batch number
/// is the unbatched bucket for that item and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stock {
    pub id: String,
    pub item_id: String,
    pub location_id: String,
    pub quantity: f64,
    /// Held for open work orders / delivery orders.
    pub reserved_quantity: f64,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// Quantity not held by any reservation: `quantity - reserved_quantity`.
    #[inline]
    pub fn available(&self) -> f64 {
        crate::stock::available(self.quantity, self.reserved_quantity)
    }
}

/// Stock row as returned by the API, with its derived availability.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockView {
    #[serde(flatten)]
    pub stock: Stock,
    pub available_quantity: f64,
}

impl From<Stock> for StockView {
    fn from(stock: Stock) -> Self {
        let available_quantity = stock.available();
        StockView {
            stock,
            available_quantity,
        }
    }
}

/// Append-only record of a single signed stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub stock_id: String,
    pub item_id: String,
    pub location_id: String,
    pub movement_type: MovementType,
    /// Positive adds to the row, negative removes.
    pub quantity: f64,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Quantity of one stock row held by an open document.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockReservation {
    pub id: String,
    pub stock_id: String,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub quantity: f64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Procurement
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub po_number: String,
    pub supplier_id: String,
    /// Where received goods are put away.
    pub destination_location_id: String,
    pub status: PurchaseOrderStatus,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub total_cents: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrderItem {
    pub id: String,
    pub purchase_order_id: String,
    pub item_id: String,
    pub quantity: f64,
    pub received_quantity: f64,
    pub unit_price_cents: i64,
}

impl PurchaseOrderItem {
    /// Quantity still expected from the supplier.
    pub fn outstanding(&self) -> f64 {
        (self.quantity - self.received_quantity).max(0.0)
    }

    /// `quantity × unit price`, rounded to whole cents. `None` if the
    /// result does not fit in `i64` cents.
    pub fn line_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).for_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoodsReceipt {
    pub id: String,
    pub receipt_number: String,
    pub purchase_order_id: String,
    pub location_id: String,
    pub received_date: NaiveDate,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoodsReceiptItem {
    pub id: String,
    pub goods_receipt_id: String,
    pub purchase_order_item_id: String,
    pub item_id: String,
    pub quantity: f64,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoodsReceiptDetail {
    #[serde(flatten)]
    pub receipt: GoodsReceipt,
    pub items: Vec<GoodsReceiptItem>,
}

// =============================================================================
// Production
// =============================================================================

/// How to make `portion_size` units of `output_item_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Recipe {
    pub id: String,
    pub code: String,
    pub name: String,
    /// Finished good produced by this recipe.
    pub output_item_id: String,
    /// Output quantity that the ingredient amounts are expressed per.
    pub portion_size: f64,
    pub portion_unit: String,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ingredient line, per `Recipe::portion_size` of output.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecipeItem {
    pub id: String,
    pub recipe_id: String,
    pub item_id: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub items: Vec<RecipeItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WorkOrder {
    pub id: String,
    pub wo_number: String,
    pub recipe_id: String,
    pub kitchen_location_id: String,
    pub planned_quantity: f64,
    /// Set on completion; may differ from plan.
    pub produced_quantity: Option<f64>,
    pub status: WorkOrderStatus,
    pub scheduled_date: NaiveDate,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ingredient cost at standard prices for the planned quantity.
    pub estimated_cost_cents: i64,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WorkOrderDetail {
    #[serde(flatten)]
    pub order: WorkOrder,
    /// Scaled ingredient amounts for `planned_quantity`.
    pub requirements: Vec<crate::recipe::ScaledIngredient>,
}

// =============================================================================
// Distribution
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryOrder {
    pub id: String,
    pub do_number: String,
    pub beneficiary_id: String,
    pub source_location_id: String,
    pub status: DeliveryOrderStatus,
    pub scheduled_date: NaiveDate,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Name of the person who signed for the delivery.
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryOrderItem {
    pub id: String,
    pub delivery_order_id: String,
    pub item_id: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryOrderDetail {
    #[serde(flatten)]
    pub order: DeliveryOrder,
    pub items: Vec<DeliveryOrderItem>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Page request as parsed from `?page=&limit=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "PageRequest::first_page")]
    pub page: u32,
    #[serde(default = "PageRequest::default_limit")]
    pub limit: u32,
}

impl PageRequest {
    fn first_page() -> u32 {
        1
    }

    fn default_limit() -> u32 {
        crate::DEFAULT_PAGE_SIZE
    }

    /// Clamps page to >= 1 and limit to 1..=MAX_PAGE_SIZE.
    pub fn normalized(self) -> Self {
        PageRequest {
            page: self.page.max(1),
            limit: self.limit.clamp(1, crate::MAX_PAGE_SIZE),
        }
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        let page = self.normalized();
        (page.page as i64 - 1) * page.limit as i64
    }

    pub fn limit(&self) -> i64 {
        self.normalized().limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: crate::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination block of the list envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let request = request.normalized();
        let limit = request.limit as i64;
        Pagination {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// One page of rows plus its pagination block.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Page {
            items,
            pagination: Pagination::new(request, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(quantity: f64, reserved: f64) -> Stock {
        let now = Utc::now();
        Stock {
            id: "s1".to_string(),
            item_id: "i1".to_string(),
            location_id: "l1".to_string(),
            quantity,
            reserved_quantity: reserved,
            batch_number: String::new(),
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_enum_round_trip_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert!("CHEF".parse::<Role>().is_err());
        assert_eq!(
            serde_json::to_string(&LocationType::DistributionPoint).unwrap(),
            "\"DISTRIBUTION_POINT\""
        );
    }

    #[test]
    fn test_stock_view_carries_available() {
        let view = StockView::from(stock(10.0, 4.0));
        assert_eq!(view.available_quantity, 6.0);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["availableQuantity"], 6.0);
        assert_eq!(json["reservedQuantity"], 4.0);
        assert_eq!(json["batchNumber"], "");
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: "A".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            is_approved: true,
            is_active: true,
            location_id: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"isApproved\":true"));
    }

    #[test]
    fn test_location_type_field_is_named_type() {
        let now = Utc::now();
        let location = Location {
            id: "l1".to_string(),
            code: "KIT-01".to_string(),
            name: "Kitchen 1".to_string(),
            location_type: LocationType::Kitchen,
            address: None,
            capacity_kg: Some(500.0),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["type"], "KITCHEN");
        assert_eq!(json["capacityKg"], 500.0);
    }

    #[test]
    fn test_po_item_outstanding() {
        let line = PurchaseOrderItem {
            id: "p1".to_string(),
            purchase_order_id: "po".to_string(),
            item_id: "i1".to_string(),
            quantity: 100.0,
            received_quantity: 40.0,
            unit_price_cents: 1500,
        };
        assert_eq!(line.outstanding(), 60.0);
        assert_eq!(line.line_total(), Some(Money::from_cents(150_000)));

        let huge = PurchaseOrderItem {
            quantity: 1e9,
            unit_price_cents: 100_000_000_000,
            ..line
        };
        assert_eq!(huge.line_total(), None);
    }

    #[test]
    fn test_pagination() {
        let request = PageRequest { page: 0, limit: 500 }.normalized();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, crate::MAX_PAGE_SIZE);

        let request = PageRequest { page: 3, limit: 20 };
        assert_eq!(request.offset(), 40);

        let pagination = Pagination::new(request, 41);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(Pagination::new(request, 0).total_pages, 0);
    }
}
