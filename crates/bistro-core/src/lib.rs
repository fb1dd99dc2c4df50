//! # bistro-core: Pure Business Logic for the Bistro Back Office
//!
//! This crate holds the restaurant's domain model and every rule that can be
//! evaluated without touching storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Desktop forms & charts (external)                    │   │
//! │  │   Ingredients │ Menus │ Clients │ Orders │ Purchase │ Reports   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ plain method calls                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │validation│ │  cart  │ │ report  │ │   │
//! │  │   │  Menu   │ │  Money  │ │  parse_* │ │Purchase│ │ Sales   │ │   │
//! │  │   │  Order  │ │         │ │validate_*│ │  Cart  │ │ Usage   │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bistro-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Ingredient, Menu, Client, Order) and input structs
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules and raw-text parsers
//! - [`cart`] - Purchase cart assembled before placing orders
//! - [`report`] - Sales, popularity and ingredient-usage aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::money::Money;
//! use bistro_core::validation::parse_price;
//!
//! let price = parse_price("5.00").unwrap();
//! assert_eq!(price, Money::from_cents(500));
//!
//! // An order total is fixed as price × quantity when the order is taken
//! assert_eq!(price.multiply_quantity(3).to_string(), "$15.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, PurchaseCart};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use report::{Chart, ChartKind, ChartPoint, ReportKind, SalesPeriod};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in one purchase cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Highest menu price, in cents (1,000,000.00).
///
/// Keeps price × quantity and report sums far from `i64` overflow.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Column sizes of the persisted text fields.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_KIND_LEN: usize = 50;
pub const MAX_UNIT_LEN: usize = 20;
pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 100;
