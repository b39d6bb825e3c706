//! # Request Inputs
//!
//! Write-side shapes accepted by the API and consumed by repositories.
//! Each input validates its own fields; cross-row rules (does the item
//! exist, is there enough stock) are checked by the database layer.
//!
//! `PUT` on master data takes the same input as `POST` and replaces every
//! writable field.

use chrono::NaiveDate;
use serde::Deserialize;
use ts_rs::TS;

use crate::types::{BeneficiaryType, ItemType, LocationType, Role};
use crate::validation::*;

fn default_true() -> bool {
    true
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUser {
    pub email: String,
    pub name: String,
    pub password: String,
    /// Requested role; defaults to BENEFICIARY_POINT. Ignored for the very
    /// first account, which always becomes an approved ADMIN.
    pub role: Option<Role>,
    pub location_id: Option<String>,
}

impl RegisterUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_email(&self.email)?;
        validate_name("name", &self.name)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

/// Admin-side account changes. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub location_id: Option<String>,
}

impl UpdateUser {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        Ok(())
    }
}

// =============================================================================
// Master Data
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("code", &self.code)?;
        validate_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LocationInput {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub address: Option<String>,
    pub capacity_kg: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl LocationInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("code", &self.code)?;
        validate_name("name", &self.name)?;
        if let Some(capacity) = self.capacity_kg {
            validate_non_negative("capacityKg", capacity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemInput {
    pub sku: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    pub unit: String,
    pub category_id: Option<String>,
    #[serde(default)]
    pub reorder_point: f64,
    #[serde(default)]
    pub price_cents: i64,
    pub shelf_life_days: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ItemInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("sku", &self.sku)?;
        validate_code("code", &self.code)?;
        validate_name("name", &self.name)?;
        validate_required("unit", &self.unit)?;
        validate_non_negative("reorderPoint", self.reorder_point)?;
        validate_price_cents("priceCents", self.price_cents)?;
        if let Some(days) = self.shelf_life_days {
            validate_days("shelfLifeDays", days)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierInput {
    pub code: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl SupplierInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("code", &self.code)?;
        validate_name("name", &self.name)?;
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BeneficiaryInput {
    pub code: String,
    pub name: String,
    pub beneficiary_type: BeneficiaryType,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub target_portions: i64,
    pub location_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl BeneficiaryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("code", &self.code)?;
        validate_name("name", &self.name)?;
        if self.target_portions < 0 {
            return Err(crate::ValidationError::Negative {
                field: "targetPortions".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Opening balance for a new stock row.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewStock {
    pub item_id: String,
    pub location_id: String,
    pub quantity: f64,
    #[serde(default)]
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
}

impl NewStock {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("itemId", &self.item_id)?;
        validate_required("locationId", &self.location_id)?;
        validate_non_negative("quantity", self.quantity)
    }
}

/// Manual correction. Targets `stock_id` when given, otherwise the
/// `(item, location, batch)` row, which is created for positive deltas.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockAdjustment {
    pub stock_id: Option<String>,
    pub item_id: Option<String>,
    pub location_id: Option<String>,
    #[serde(default)]
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    /// Signed change to `quantity`.
    pub delta: f64,
    pub reason: String,
}

impl StockAdjustment {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.stock_id.is_none() {
            validate_required("itemId", self.item_id.as_deref().unwrap_or_default())?;
            validate_required("locationId", self.location_id.as_deref().unwrap_or_default())?;
        }
        validate_delta("delta", self.delta)?;
        validate_required("reason", &self.reason)
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockTransfer {
    pub item_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub quantity: f64,
    /// Restricts the transfer to one batch; FEFO across batches otherwise.
    pub batch_number: Option<String>,
    pub note: Option<String>,
}

impl StockTransfer {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("itemId", &self.item_id)?;
        validate_required("fromLocationId", &self.from_location_id)?;
        validate_required("toLocationId", &self.to_location_id)?;
        if self.from_location_id == self.to_location_id {
            return Err(crate::ValidationError::InvalidFormat {
                field: "toLocationId".to_string(),
                reason: "must differ from fromLocationId".to_string(),
            });
        }
        validate_positive("quantity", self.quantity)
    }
}

// =============================================================================
// Procurement
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrderLineInput {
    pub item_id: String,
    pub quantity: f64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrderInput {
    pub supplier_id: String,
    pub destination_location_id: String,
    /// Defaults to today.
    pub order_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseOrderLineInput>,
}

impl PurchaseOrderInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("supplierId", &self.supplier_id)?;
        validate_required("destinationLocationId", &self.destination_location_id)?;
        validate_lines("items", self.items.iter().map(|l| l.item_id.as_str()))?;
        for line in &self.items {
            validate_positive("items.quantity", line.quantity)?;
            validate_price_cents("items.unitPriceCents", line.unit_price_cents)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoodsReceiptLineInput {
    pub purchase_order_item_id: String,
    pub quantity: f64,
    #[serde(default)]
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoodsReceiptInput {
    pub purchase_order_id: String,
    /// Defaults to today.
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<GoodsReceiptLineInput>,
}

impl GoodsReceiptInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("purchaseOrderId", &self.purchase_order_id)?;
        validate_lines(
            "items",
            self.items.iter().map(|l| l.purchase_order_item_id.as_str()),
        )?;
        for line in &self.items {
            validate_positive("items.quantity", line.quantity)?;
        }
        Ok(())
    }
}

// =============================================================================
// Production
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecipeLineInput {
    pub item_id: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecipeInput {
    pub code: String,
    pub name: String,
    pub output_item_id: String,
    pub portion_size: f64,
    pub portion_unit: String,
    pub instructions: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub items: Vec<RecipeLineInput>,
}

impl RecipeInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("code", &self.code)?;
        validate_name("name", &self.name)?;
        validate_required("outputItemId", &self.output_item_id)?;
        validate_positive("portionSize", self.portion_size)?;
        validate_required("portionUnit", &self.portion_unit)?;
        validate_lines("items", self.items.iter().map(|l| l.item_id.as_str()))?;
        for line in &self.items {
            validate_positive("items.quantity", line.quantity)?;
            validate_required("items.unit", &line.unit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WorkOrderInput {
    pub recipe_id: String,
    pub kitchen_location_id: String,
    pub planned_quantity: f64,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
}

impl WorkOrderInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("recipeId", &self.recipe_id)?;
        validate_required("kitchenLocationId", &self.kitchen_location_id)?;
        validate_positive("plannedQuantity", self.planned_quantity)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompleteWorkOrder {
    /// Actual output; defaults to the planned quantity.
    pub produced_quantity: Option<f64>,
    pub notes: Option<String>,
}

impl CompleteWorkOrder {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(produced) = self.produced_quantity {
            validate_non_negative("producedQuantity", produced)?;
        }
        Ok(())
    }
}

// =============================================================================
// Distribution
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryOrderLineInput {
    pub item_id: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryOrderInput {
    pub beneficiary_id: String,
    pub source_location_id: String,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
    pub items: Vec<DeliveryOrderLineInput>,
}

impl DeliveryOrderInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("beneficiaryId", &self.beneficiary_id)?;
        validate_required("sourceLocationId", &self.source_location_id)?;
        validate_lines("items", self.items.iter().map(|l| l.item_id.as_str()))?;
        for line in &self.items {
            validate_positive("items.quantity", line.quantity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConfirmDelivery {
    pub received_by: String,
    pub notes: Option<String>,
}

impl ConfirmDelivery {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("receivedBy", &self.received_by)
    }
}
