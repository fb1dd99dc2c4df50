//! # Order Repository
//!
//! Database operations for orders. Orders are created and deleted, never
//! updated.
//!
//! ## Order Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Creation                                       │
//! │                                                                         │
//! │  NewOrder { client_id, menu_id, quantity: 3, description: None }       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Validate quantity > 0                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Client exists?  Menu exists? ──── no ──► DbError::NotFound            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total_cents = menu.price_cents × 3   ← frozen here, never recomputed  │
//! │  description = "3 x Bread"            ← when none was given            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT orders                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purchase Cart
//! `place_cart` turns every cart line into one order inside a single
//! transaction. Either every line becomes an order or none does.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bistro_core::{
    new_id, Menu, NewOrder, Order, OrderDetail, PurchaseCart, ValidationError,
};

const SELECT_ORDER: &str = "SELECT id, description, total_cents, quantity, client_id, menu_id, created_at \
     FROM orders";

const SELECT_ORDER_DETAIL: &str = "SELECT o.id, o.description, o.total_cents, o.quantity, \
            o.client_id, c.name AS client_name, o.menu_id, m.name AS menu_name, o.created_at \
     FROM orders o \
     LEFT JOIN clients c ON c.id = o.client_id \
     LEFT JOIN menus m ON m.id = o.menu_id";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Takes an order now.
    ///
    /// ## Returns
    /// * `Ok(Order)` - With `total_cents = menu price × quantity`
    /// * `Err(DbError::Validation)` - Quantity ≤ 0
    /// * `Err(DbError::NotFound)` - Unknown client or menu
    pub async fn create(&self, input: &NewOrder) -> DbResult<Order> {
        self.create_at(input, Utc::now()).await
    }

    /// Takes an order with an explicit order date.
    pub async fn create_at(&self, input: &NewOrder, placed_at: DateTime<Utc>) -> DbResult<Order> {
        let input = input.validated()?;

        self.ensure_client_exists(&input.client_id).await?;
        let menu = self.fetch_menu(&input.menu_id).await?;

        let order = price_order(
            &menu,
            &input.client_id,
            input.quantity,
            input.description,
            placed_at,
        )?;

        debug!(
            id = %order.id,
            menu = %menu.name,
            quantity = order.quantity,
            total_cents = order.total_cents,
            "Creating order"
        );

        let mut conn = self.pool.acquire().await?;
        insert_order(&mut conn, &order).await?;

        Ok(order)
    }

    /// Places every line of a purchase cart as an order for one client.
    ///
    /// Each order is priced from the menu as stored now, not from the
    /// price snapshotted in the cart.
    ///
    /// ## Returns
    /// * `Ok(Vec<Order>)` - One order per cart line, in cart order
    /// * `Err(DbError::Validation)` - Empty cart
    /// * `Err(DbError::NotFound)` - Unknown client or a menu that no longer
    ///   exists; nothing is written
    pub async fn place_cart(&self, client_id: &str, cart: &PurchaseCart) -> DbResult<Vec<Order>> {
        if cart.is_empty() {
            return Err(ValidationError::required("cart").into());
        }

        self.ensure_client_exists(client_id).await?;

        let placed_at = Utc::now();
        let mut orders = Vec::with_capacity(cart.line_count());
        for line in cart.lines() {
            let menu = self.fetch_menu(&line.menu_id).await?;
            orders.push(price_order(&menu, client_id, line.quantity, None, placed_at)?);
        }

        let mut tx = self.pool.begin().await?;
        for order in &orders {
            insert_order(&mut tx, order).await?;
        }
        tx.commit().await?;

        info!(
            client_id = %client_id,
            orders = orders.len(),
            total_cents = orders.iter().map(|o| o.total_cents).sum::<i64>(),
            "Purchase cart placed"
        );

        Ok(orders)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_ORDER} ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Orders of one client, newest first.
    pub async fn list_by_client(&self, client_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_ORDER} WHERE client_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// All orders with client and menu names, newest first.
    pub async fn list_details(&self) -> DbResult<Vec<OrderDetail>> {
        let details = sqlx::query_as::<_, OrderDetail>(&format!(
            "{SELECT_ORDER_DETAIL} ORDER BY o.created_at DESC, o.rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    pub async fn list_details_by_client(&self, client_id: &str) -> DbResult<Vec<OrderDetail>> {
        let details = sqlx::query_as::<_, OrderDetail>(&format!(
            "{SELECT_ORDER_DETAIL} WHERE o.client_id = ?1 ORDER BY o.created_at DESC, o.rowid DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes an order. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ensure_client_exists(&self, client_id: &str) -> DbResult<()> {
        let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE id = ?1")
            .bind(client_id)
            .fetch_one(&self.pool)
            .await?;

        if found == 0 {
            return Err(DbError::not_found("Client", client_id));
        }
        Ok(())
    }

    async fn fetch_menu(&self, menu_id: &str) -> DbResult<Menu> {
        sqlx::query_as::<_, Menu>(
            "SELECT id, name, description, price_cents, created_at, updated_at \
             FROM menus WHERE id = ?1",
        )
        .bind(menu_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Menu", menu_id))
    }
}

/// Builds an order priced from `menu` as it is now.
fn price_order(
    menu: &Menu,
    client_id: &str,
    quantity: i64,
    description: Option<String>,
    placed_at: DateTime<Utc>,
) -> DbResult<Order> {
    let total_cents = menu
        .price_cents
        .checked_mul(quantity)
        .ok_or_else(|| ValidationError::invalid_format("quantity", "order total too large"))?;

    Ok(Order {
        id: new_id(),
        description: description
            .unwrap_or_else(|| Order::default_description(quantity, &menu.name)),
        total_cents,
        quantity,
        client_id: Some(client_id.to_string()),
        menu_id: Some(menu.id.clone()),
        created_at: placed_at,
    })
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, description, total_cents, quantity, client_id, menu_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&order.id)
    .bind(&order.description)
    .bind(order.total_cents)
    .bind(order.quantity)
    .bind(&order.client_id)
    .bind(&order.menu_id)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
