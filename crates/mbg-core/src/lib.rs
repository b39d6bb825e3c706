//! # mbg-core: Pure Business Logic for the MBG Inventory System
//!
//! This crate holds the domain model and every calculation the backend
//! performs on it, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      MBG Inventory Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (React)                            │   │
//! │  │    Items ──► Stock ──► Purchase ──► Production ──► Delivery     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mbg-api (axum handlers)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mbg-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │  recipe   │  │  status   │  │   │
//! │  │   │  Item     │  │ available │  │  scaling  │  │  PO / WO  │  │   │
//! │  │   │  Stock    │  │   FEFO    │  │  costing  │  │  DO flows │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mbg-db (Database Layer)                      │   │
//! │  │          SQLite queries, migrations, stock postings             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Stock, Recipe, WorkOrder, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`stock`] - Available quantity, per-item summaries, FEFO allocation
//! - [`recipe`] - Ingredient scaling and cost derivation
//! - [`status`] - Document lifecycle transitions
//! - [`validation`] - Field validators
//! - [`input`] - Request shapes with their validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use mbg_core::recipe::scale_quantity;
//!
//! // 0.08 kg rice per portion, 250 portions
//! let rice = scale_quantity(0.08, 1.0, 250.0).unwrap();
//! assert!((rice - 20.0).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod input;
pub mod money;
pub mod recipe;
pub mod status;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on page size so a single request cannot dump a whole table.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Tolerance for comparing floating point quantities.
///
/// Quantities are stored as REAL (kg, litres, pieces). Sums of scaled recipe
/// amounts pick up representation error, so comparisons against available
/// stock allow this much slack.
pub const QUANTITY_EPSILON: f64 = 1e-9;
