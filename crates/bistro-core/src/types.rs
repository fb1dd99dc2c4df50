//! # Domain Types
//!
//! Records persisted by the back office and the input structs used to
//! create or change them.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌──────────────────┐      ┌──────────────┐ │
//! │  │   Ingredient    │ N    N │  MenuIngredient  │ N  1 │     Menu     │ │
//! │  │  ─────────────  │◄──────►│  ──────────────  │◄────►│ ──────────── │ │
//! │  │  name (unique)  │        │  menu_id         │      │ name (unique)│ │
//! │  │  kind, unit     │        │  ingredient_id   │      │ price_cents  │ │
//! │  │  quantity       │        │  quantity (pair) │      │ description  │ │
//! │  └─────────────────┘        └──────────────────┘      └──────┬───────┘ │
//! │                                                              │ 1       │
//! │  ┌─────────────────┐ 1                          N ┌──────────▼───────┐ │
//! │  │     Client      │─────────────────────────────►│      Order       │ │
//! │  │  email (unique) │                              │ total_cents      │ │
//! │  └─────────────────┘                              │ (frozen at       │ │
//! │                                                   │  creation)       │ │
//! │                                                   └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record is identified by a UUID v4 string generated by the access
//! layer; names and emails are the human-facing keys.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::validation::{
    validate_amount, validate_email, validate_ingredient_quantities, validate_optional_text,
    validate_price_cents, validate_quantity, validate_text, ValidationResult,
};
use crate::{MAX_DESCRIPTION_LEN, MAX_EMAIL_LEN, MAX_KIND_LEN, MAX_NAME_LEN, MAX_UNIT_LEN};

/// Ingredient id → quantity used by one unit of a menu.
///
/// A map, so a menu can reference each ingredient at most once.
pub type IngredientQuantities = BTreeMap<String, f64>;

/// Generates a new record identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Ingredient
// =============================================================================

/// A stocked ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ingredient {
    pub id: String,

    /// Unique across all ingredients.
    pub name: String,

    /// Category ("Cereal", "Dairy", ...). Free text.
    pub kind: String,

    /// Quantity in stock, expressed in `unit`.
    pub quantity: f64,

    pub unit: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub kind: String,
    pub quantity: f64,
    pub unit: String,
}

impl NewIngredient {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        NewIngredient {
            name: name.into(),
            kind: kind.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// Returns a trimmed copy, or the first rule the input breaks.
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(NewIngredient {
            name: validate_text("name", &self.name, MAX_NAME_LEN)?,
            kind: validate_text("type", &self.kind, MAX_KIND_LEN)?,
            quantity: validate_amount("quantity", self.quantity)?,
            unit: validate_text("unit", &self.unit, MAX_UNIT_LEN)?,
        })
    }
}

/// Partial update of an ingredient. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl IngredientPatch {
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(IngredientPatch {
            name: self
                .name
                .as_deref()
                .map(|v| validate_text("name", v, MAX_NAME_LEN))
                .transpose()?,
            kind: self
                .kind
                .as_deref()
                .map(|v| validate_text("type", v, MAX_KIND_LEN))
                .transpose()?,
            quantity: self
                .quantity
                .map(|v| validate_amount("quantity", v))
                .transpose()?,
            unit: self
                .unit
                .as_deref()
                .map(|v| validate_text("unit", v, MAX_UNIT_LEN))
                .transpose()?,
        })
    }
}

// =============================================================================
// Menu
// =============================================================================

/// A sellable dish composed of ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Menu {
    pub id: String,

    /// Unique across all menus.
    pub name: String,

    pub description: Option<String>,

    /// Price in cents, always > 0.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Input for creating a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMenu {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    /// Must reference at least one ingredient.
    pub ingredients: IngredientQuantities,
}

impl NewMenu {
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(NewMenu {
            name: validate_text("name", &self.name, MAX_NAME_LEN)?,
            description: validate_optional_text(
                "description",
                self.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
            price_cents: validate_price_cents(self.price_cents)?,
            ingredients: validate_ingredient_quantities(&self.ingredients)?,
        })
    }
}

/// Partial update of a menu.
///
/// A blank `description` clears it. A supplied `ingredients` map replaces
/// the whole previous mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub ingredients: Option<IngredientQuantities>,
}

impl MenuPatch {
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(MenuPatch {
            name: self
                .name
                .as_deref()
                .map(|v| validate_text("name", v, MAX_NAME_LEN))
                .transpose()?,
            // Some("") survives as Some("") so the repository can clear the column
            description: match self.description.as_deref() {
                Some(v) => Some(
                    validate_optional_text("description", Some(v), MAX_DESCRIPTION_LEN)?
                        .unwrap_or_default(),
                ),
                None => None,
            },
            price_cents: self.price_cents.map(validate_price_cents).transpose()?,
            ingredients: self
                .ingredients
                .as_ref()
                .map(validate_ingredient_quantities)
                .transpose()?,
        })
    }
}

/// The association record: one menu uses one ingredient in a given quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MenuIngredient {
    pub menu_id: String,
    pub ingredient_id: String,
    /// Quantity per menu unit; independent of the ingredient's stock.
    pub quantity: f64,
}

/// An ingredient of a menu merged with its pair-specific quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MenuIngredientDetail {
    pub ingredient_id: String,
    pub name: String,
    pub kind: String,
    pub unit: String,
    /// Quantity used by one unit of the menu.
    pub quantity: f64,
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Unique across all clients.
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
}

impl NewClient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        NewClient {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(NewClient {
            name: validate_text("name", &self.name, MAX_NAME_LEN)?,
            email: validate_email(&self.email, MAX_EMAIL_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ClientPatch {
    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(ClientPatch {
            name: self
                .name
                .as_deref()
                .map(|v| validate_text("name", v, MAX_NAME_LEN))
                .transpose()?,
            email: self
                .email
                .as_deref()
                .map(|v| validate_email(v, MAX_EMAIL_LEN))
                .transpose()?,
        })
    }
}

// =============================================================================
// Order
// =============================================================================

/// A client's purchase of a quantity of one menu.
///
/// ## Snapshot Pattern
/// `total_cents` is computed once, from the menu price at the moment the
/// order is taken. A later price change never touches existing orders.
/// The references become `None` if the client or menu is deleted; the
/// total and description keep the sale on record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub description: String,
    pub total_cents: i64,
    pub quantity: i64,
    pub client_id: Option<String>,
    pub menu_id: Option<String>,
    /// The order date.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Description used when the order is taken without one: `"3 x Bread"`.
    pub fn default_description(quantity: i64, menu_name: &str) -> String {
        format!("{} x {}", quantity, menu_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_id: String,
    pub menu_id: String,
    pub quantity: i64,
    pub description: Option<String>,
}

impl NewOrder {
    pub fn new(client_id: impl Into<String>, menu_id: impl Into<String>, quantity: i64) -> Self {
        NewOrder {
            client_id: client_id.into(),
            menu_id: menu_id.into(),
            quantity,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validated(&self) -> ValidationResult<Self> {
        Ok(NewOrder {
            client_id: validate_text("client", &self.client_id, MAX_NAME_LEN)?,
            menu_id: validate_text("menu", &self.menu_id, MAX_NAME_LEN)?,
            quantity: validate_quantity(self.quantity)?,
            description: validate_optional_text(
                "description",
                self.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
        })
    }
}

/// An order joined with the names shown in the order list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderDetail {
    pub id: String,
    pub description: String,
    pub total_cents: i64,
    pub quantity: i64,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub menu_id: Option<String>,
    pub menu_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[test]
    fn test_new_ingredient_is_trimmed() {
        let input = NewIngredient::new("  Flour ", "Cereal", 10.0, " kg");
        let valid = input.validated().unwrap();
        assert_eq!(valid.name, "Flour");
        assert_eq!(valid.unit, "kg");
    }

    #[test]
    fn test_new_ingredient_rejects_non_positive_quantity() {
        let err = NewIngredient::new("Flour", "Cereal", 0.0, "kg")
            .validated()
            .unwrap_err();
        assert_eq!(err, ValidationError::must_be_positive("quantity"));
    }

    #[test]
    fn test_ingredient_patch_only_checks_supplied_fields() {
        let patch = IngredientPatch {
            quantity: Some(2.5),
            ..Default::default()
        };
        assert_eq!(patch.validated().unwrap().quantity, Some(2.5));

        let bad = IngredientPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(bad.validated().is_err());
    }

    #[test]
    fn test_new_menu_requires_an_ingredient() {
        let menu = NewMenu {
            name: "Bread".to_string(),
            description: None,
            price_cents: 500,
            ingredients: IngredientQuantities::new(),
        };
        assert_eq!(
            menu.validated().unwrap_err(),
            ValidationError::required("ingredients")
        );
    }

    #[test]
    fn test_new_menu_rejects_zero_price() {
        let mut ingredients = IngredientQuantities::new();
        ingredients.insert(new_id(), 0.2);
        let menu = NewMenu {
            name: "Bread".to_string(),
            description: Some("  ".to_string()),
            price_cents: 0,
            ingredients,
        };
        assert_eq!(
            menu.validated().unwrap_err(),
            ValidationError::must_be_positive("price")
        );
    }

    #[test]
    fn test_menu_patch_blank_description_clears() {
        let patch = MenuPatch {
            description: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.validated().unwrap().description, Some(String::new()));
    }

    #[test]
    fn test_new_client_checks_email() {
        assert!(NewClient::new("A", "a@x.com").validated().is_ok());
        assert!(NewClient::new("A", "not-an-email").validated().is_err());
        assert!(NewClient::new("", "a@x.com").validated().is_err());
    }

    #[test]
    fn test_new_order_blank_description_becomes_none() {
        let order = NewOrder::new("c", "m", 3).with_description("  ");
        assert_eq!(order.validated().unwrap().description, None);
        assert!(NewOrder::new("c", "m", 0).validated().is_err());
    }

    #[test]
    fn test_default_description() {
        assert_eq!(Order::default_description(3, "Bread"), "3 x Bread");
    }

    #[test]
    fn test_new_id_is_uuid() {
        assert!(Uuid::parse_str(&new_id()).is_ok());
    }
}
