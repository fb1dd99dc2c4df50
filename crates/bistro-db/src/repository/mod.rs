//! # Repository Module
//!
//! One repository per entity, plus the read-only report queries.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Presentation layer                                                    │
//! │       │                                                                 │
//! │       │  db.menus().create(&new_menu)                                  │
//! │       ▼                                                                 │
//! │  IngredientRepository   create │ update │ delete │ get │ list         │
//! │  MenuRepository         + ingredients(menu) │ associations(menu)      │
//! │  ClientRepository       + get_by_email                                 │
//! │  OrderRepository        create │ place_cart │ list │ delete (no update)│
//! │  ReportRepository       sales_by_period │ popular_menus │ usage        │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - `get*` returns `Ok(None)` and `delete` returns `Ok(false)` for an
//!   unknown id.
//! - `update` on an unknown id, or a write that references a missing
//!   record, fails with `DbError::NotFound`.
//! - Uniqueness and references are checked before anything is written.

pub mod client;
pub mod ingredient;
pub mod menu;
pub mod order;
pub mod report;
