//! # Purchase Cart
//!
//! The staff purchase panel: menus and quantities collected for one client
//! before they are placed as orders.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Purchase Cart Operations                             │
//! │                                                                         │
//! │  Staff Action             Method                  Cart Change           │
//! │  ────────────             ──────                  ───────────           │
//! │                                                                         │
//! │  Pick menu + qty ────────► add() ───────────────► lines.push(line)     │
//! │  Change quantity ────────► update_quantity() ───► lines[i].qty = n     │
//! │  Remove line ────────────► remove() ────────────► lines.remove(i)      │
//! │  Start over ─────────────► clear() ─────────────► lines.clear()        │
//! │                                                                         │
//! │  Confirm ────────────────► OrderRepository::place_cart(client, &cart)  │
//! │                            one order per line, one transaction          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is plain data. The owner decides how it is shared.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Menu;
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// One menu in the cart.
///
/// Name and price are copied when the line is added, so the panel shows
/// stable figures. Placing the cart prices each order from the menu as
/// stored at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub menu_id: String,
    pub menu_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    fn from_menu(menu: &Menu, quantity: i64) -> Self {
        CartLine {
            menu_id: menu.id.clone(),
            menu_name: menu.name.clone(),
            unit_price_cents: menu.price_cents,
            quantity,
        }
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// One line per `add`, kept in insertion order; every quantity is within
/// 1..=999. Lines are addressed by position, as the panel lists them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseCart {
    lines: Vec<CartLine>,
}

fn check_line_quantity(quantity: i64) -> CoreResult<i64> {
    validate_quantity(quantity)?;
    if quantity > MAX_LINE_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(quantity)
}

impl PurchaseCart {
    pub fn new() -> Self {
        PurchaseCart::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Appends a line. Adding a menu already in the cart gives it a second
    /// line, which becomes a second order when the cart is placed.
    ///
    /// Returns the index of the new line.
    pub fn add(&mut self, menu: &Menu, quantity: i64) -> CoreResult<usize> {
        let quantity = check_line_quantity(quantity)?;

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_menu(menu, quantity));
        Ok(self.lines.len() - 1)
    }

    /// Sets the quantity of the line at `index`. Zero removes it.
    pub fn update_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(index).map(|_| ());
        }

        let quantity = check_line_quantity(quantity)?;
        match self.lines.get_mut(index) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::NotInCart(index)),
        }
    }

    /// Removes the line at `index`; later lines shift down by one.
    pub fn remove(&mut self, index: usize) -> CoreResult<CartLine> {
        if index >= self.lines.len() {
            return Err(CoreError::NotInCart(index));
        }
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals at the snapshotted prices.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn menu(id: &str, name: &str, price_cents: i64) -> Menu {
        Menu {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            price_cents,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_keeps_one_line_per_add() {
        let bread = menu("m1", "Bread", 500);
        let mut cart = PurchaseCart::new();

        assert_eq!(cart.add(&bread, 2).unwrap(), 0);
        assert_eq!(cart.add(&bread, 3).unwrap(), 1);

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[1].quantity, 3);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total(), Money::from_cents(2500));
    }

    #[test]
    fn test_totals_across_lines() {
        let mut cart = PurchaseCart::new();
        cart.add(&menu("m1", "Bread", 500), 3).unwrap();
        cart.add(&menu("m2", "Soup", 410), 2).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total().cents(), 2320);
        assert_eq!(cart.lines()[1].line_total().cents(), 820);
    }

    #[test]
    fn test_add_rejects_bad_quantities() {
        let bread = menu("m1", "Bread", 500);
        let mut cart = PurchaseCart::new();

        assert!(matches!(cart.add(&bread, 0), Err(CoreError::Validation(_))));
        assert!(matches!(
            cart.add(&bread, 1000),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
        assert!(cart.is_empty());

        cart.add(&bread, 999).unwrap();
        cart.add(&bread, 999).unwrap();
        assert_eq!(cart.total_quantity(), 1998);
    }

    #[test]
    fn test_line_limit() {
        let bread = menu("m1", "Bread", 100);
        let mut cart = PurchaseCart::new();
        for _ in 0..MAX_CART_LINES {
            cart.add(&bread, 1).unwrap();
        }

        assert!(matches!(
            cart.add(&bread, 1),
            Err(CoreError::CartTooLarge { max: MAX_CART_LINES })
        ));
    }

    #[test]
    fn test_update_quantity_and_remove_by_index() {
        let mut cart = PurchaseCart::new();
        cart.add(&menu("m1", "Bread", 500), 1).unwrap();
        cart.add(&menu("m2", "Soup", 300), 1).unwrap();
        cart.add(&menu("m1", "Bread", 500), 2).unwrap();

        cart.update_quantity(0, 4).unwrap();
        assert_eq!(cart.total_quantity(), 7);
        assert!(matches!(
            cart.update_quantity(0, 1000),
            Err(CoreError::QuantityTooLarge { .. })
        ));

        cart.update_quantity(1, 0).unwrap();
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.lines()[1].menu_name, "Bread");
        assert_eq!(cart.lines()[1].quantity, 2);

        assert!(matches!(cart.update_quantity(5, 1), Err(CoreError::NotInCart(5))));
        assert!(matches!(cart.remove(2), Err(CoreError::NotInCart(2))));

        let removed = cart.remove(0).unwrap();
        assert_eq!(removed.quantity, 4);
        cart.remove(0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_saturates_instead_of_overflowing() {
        let mut cart = PurchaseCart::new();
        cart.add(&menu("m1", "Gold Leaf", i64::MAX / 2), 3).unwrap();
        cart.add(&menu("m2", "Gold Leaf", i64::MAX / 2), 3).unwrap();

        assert_eq!(cart.lines()[0].line_total().cents(), i64::MAX);
        assert_eq!(cart.total().cents(), i64::MAX);
    }

    #[test]
    fn test_snapshot_survives_menu_change() {
        let mut bread = menu("m1", "Bread", 500);
        let mut cart = PurchaseCart::new();
        cart.add(&bread, 1).unwrap();

        bread.price_cents = 900;
        assert_eq!(cart.lines()[0].unit_price_cents, 500);
    }

    #[test]
    fn test_clear() {
        let mut cart = PurchaseCart::new();
        cart.add(&menu("m1", "Bread", 500), 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());
    }
}
