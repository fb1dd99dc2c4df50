//! # Menu Repository
//!
//! Database operations for menus and their ingredient associations.
//!
//! ## Write Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Menu Create / Update                                 │
//! │                                                                         │
//! │  1. Validate input (bistro-core)          ─┐                            │
//! │  2. Name not taken by another menu         │ no connection held,        │
//! │  3. Every referenced ingredient exists    ─┘ nothing written yet        │
//! │                                                                         │
//! │  4. BEGIN                                                               │
//! │     ├── INSERT / UPDATE menus                                           │
//! │     ├── DELETE FROM menu_ingredients  (update with a new mapping only)  │
//! │     └── INSERT menu_ingredients × N                                     │
//! │     COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A supplied mapping replaces the previous one entirely; there is no merge.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::{
    new_id, IngredientQuantities, Menu, MenuIngredient, MenuIngredientDetail, MenuPatch, NewMenu,
};

const SELECT_MENU: &str =
    "SELECT id, name, description, price_cents, created_at, updated_at FROM menus";

/// Repository for menu database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Creates a menu together with its ingredient associations.
    ///
    /// ## Returns
    /// * `Ok(Menu)` - The stored menu
    /// * `Err(DbError::Validation)` - Bad field, price ≤ 0, empty mapping,
    ///   pair quantity ≤ 0
    /// * `Err(DbError::UniqueViolation)` - Name already taken
    /// * `Err(DbError::NotFound)` - A referenced ingredient does not exist
    pub async fn create(&self, input: &NewMenu) -> DbResult<Menu> {
        let input = input.validated()?;

        if self.get_by_name(&input.name).await?.is_some() {
            return Err(DbError::duplicate("name", &input.name));
        }
        self.ensure_ingredients_exist(&input.ingredients).await?;

        let now = Utc::now();
        let menu = Menu {
            id: new_id(),
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %menu.id,
            name = %menu.name,
            ingredients = input.ingredients.len(),
            "Creating menu"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO menus (id, name, description, price_cents, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&menu.id)
        .bind(&menu.name)
        .bind(&menu.description)
        .bind(menu.price_cents)
        .bind(menu.created_at)
        .bind(menu.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_associations(&mut tx, &menu.id, &input.ingredients).await?;

        tx.commit().await?;

        Ok(menu)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Menu>> {
        let menu = sqlx::query_as::<_, Menu>(&format!("{SELECT_MENU} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(menu)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Menu>> {
        let menu = sqlx::query_as::<_, Menu>(&format!("{SELECT_MENU} WHERE name = ?1"))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(menu)
    }

    /// Lists all menus ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Menu>> {
        let menus = sqlx::query_as::<_, Menu>(&format!("{SELECT_MENU} ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = menus.len(), "Listed menus");
        Ok(menus)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menus")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Ingredients of a menu with the quantity one unit of the menu uses,
    /// ordered by ingredient name. Empty for an unknown menu.
    pub async fn ingredients(&self, menu_id: &str) -> DbResult<Vec<MenuIngredientDetail>> {
        let details = sqlx::query_as::<_, MenuIngredientDetail>(
            "SELECT i.id AS ingredient_id, i.name, i.kind, i.unit, mi.quantity \
             FROM menu_ingredients mi \
             INNER JOIN ingredients i ON i.id = mi.ingredient_id \
             WHERE mi.menu_id = ?1 \
             ORDER BY i.name, i.id",
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Raw association records of a menu.
    pub async fn associations(&self, menu_id: &str) -> DbResult<Vec<MenuIngredient>> {
        let pairs = sqlx::query_as::<_, MenuIngredient>(
            "SELECT menu_id, ingredient_id, quantity FROM menu_ingredients \
             WHERE menu_id = ?1 ORDER BY rowid",
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    /// Updates the supplied fields of a menu.
    ///
    /// A blank description clears it. A supplied `ingredients` map replaces
    /// every previous association of the menu.
    ///
    /// ## Returns
    /// * `Ok(Menu)` - The menu after the update
    /// * `Err(DbError::NotFound)` - Unknown menu or referenced ingredient
    /// * `Err(DbError::UniqueViolation)` - New name belongs to another menu
    pub async fn update(&self, id: &str, patch: &MenuPatch) -> DbResult<Menu> {
        let patch = patch.validated()?;

        let mut menu = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Menu", id))?;

        if let Some(name) = patch.name {
            if name != menu.name {
                if let Some(other) = self.get_by_name(&name).await? {
                    if other.id != menu.id {
                        return Err(DbError::duplicate("name", name));
                    }
                }
            }
            menu.name = name;
        }
        if let Some(description) = patch.description {
            menu.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(price_cents) = patch.price_cents {
            menu.price_cents = price_cents;
        }
        if let Some(ingredients) = &patch.ingredients {
            self.ensure_ingredients_exist(ingredients).await?;
        }
        menu.updated_at = Utc::now();

        debug!(
            id = %id,
            name = %menu.name,
            replaces_ingredients = patch.ingredients.is_some(),
            "Updating menu"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE menus SET name = ?1, description = ?2, price_cents = ?3, updated_at = ?4 \
             WHERE id = ?5",
        )
        .bind(&menu.name)
        .bind(&menu.description)
        .bind(menu.price_cents)
        .bind(menu.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(ingredients) = &patch.ingredients {
            sqlx::query("DELETE FROM menu_ingredients WHERE menu_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            insert_associations(&mut tx, id, ingredients).await?;
        }

        tx.commit().await?;

        Ok(menu)
    }

    /// Deletes a menu. Its associations go with it; its orders stay with
    /// `menu_id` set to NULL.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting menu");

        let result = sqlx::query("DELETE FROM menus WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ensure_ingredients_exist(&self, ingredients: &IngredientQuantities) -> DbResult<()> {
        for ingredient_id in ingredients.keys() {
            let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients WHERE id = ?1")
                .bind(ingredient_id)
                .fetch_one(&self.pool)
                .await?;

            if found == 0 {
                return Err(DbError::not_found("Ingredient", ingredient_id));
            }
        }
        Ok(())
    }
}

async fn insert_associations(
    conn: &mut SqliteConnection,
    menu_id: &str,
    ingredients: &IngredientQuantities,
) -> DbResult<()> {
    for (ingredient_id, quantity) in ingredients {
        sqlx::query(
            "INSERT INTO menu_ingredients (menu_id, ingredient_id, quantity) VALUES (?1, ?2, ?3)",
        )
        .bind(menu_id)
        .bind(ingredient_id)
        .bind(*quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
