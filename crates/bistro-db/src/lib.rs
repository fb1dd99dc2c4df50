//! # bistro-db: Storage Layer for the Bistro Back Office
//!
//! SQLite storage for ingredients, menus, clients and orders, plus the
//! read-only queries behind the sales charts. Uses sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Data Flow                                 │
//! │                                                                         │
//! │  Presentation (forms, purchase panel, charts)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bistro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Ingredient     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Menu  Client   │    │ 001_initial  │  │   │
//! │  │   │ DbConfig      │    │ Order  Report  │    │  _schema.sql │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   $BISTRO_DB_PATH or <platform data dir>/bistro.db              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bistro_db::{Database, DbConfig};
//! use bistro_core::{NewClient, NewOrder};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let client = db.clients().create(&NewClient::new("A", "a@x.com")).await?;
//! let order = db.orders().create(&NewOrder::new(&client.id, &menu_id, 3)).await?;
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

pub use error::{DbError, DbResult, ErrorKind};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::ingredient::IngredientRepository;
pub use repository::menu::MenuRepository;
pub use repository::order::OrderRepository;
pub use repository::report::ReportRepository;
