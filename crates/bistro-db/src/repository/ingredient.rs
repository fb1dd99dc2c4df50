//! # Ingredient Repository
//!
//! Database operations for stocked ingredients.
//!
//! ## Delete Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete(flour_id)                                                       │
//! │       │                                                                 │
//! │       ├── not stored?            → Ok(false)                            │
//! │       │                                                                 │
//! │       ├── used by N menus?       → Err(InUse { count: N })              │
//! │       │   (menu_ingredients has ON DELETE RESTRICT as a backstop)       │
//! │       │                                                                 │
//! │       └── unused                 → DELETE, Ok(true)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A silent cascade could leave a menu with no ingredient at all, so the
//! caller has to change or delete the menus first.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use bistro_core::{new_id, Ingredient, IngredientPatch, NewIngredient};

const SELECT_INGREDIENT: &str =
    "SELECT id, name, kind, quantity, unit, created_at, updated_at FROM ingredients";

/// Repository for ingredient database operations.
///
/// ## Usage
/// ```rust,ignore
/// let flour = db.ingredients()
///     .create(&NewIngredient::new("Flour", "Cereal", 10.0, "kg"))
///     .await?;
/// let all = db.ingredients().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    /// Creates an ingredient.
    ///
    /// ## Returns
    /// * `Ok(Ingredient)` - The stored record
    /// * `Err(DbError::Validation)` - Blank or oversized field, quantity ≤ 0
    /// * `Err(DbError::UniqueViolation)` - Name already taken
    pub async fn create(&self, input: &NewIngredient) -> DbResult<Ingredient> {
        let input = input.validated()?;

        if self.get_by_name(&input.name).await?.is_some() {
            return Err(DbError::duplicate("name", &input.name));
        }

        let now = Utc::now();
        let ingredient = Ingredient {
            id: new_id(),
            name: input.name,
            kind: input.kind,
            quantity: input.quantity,
            unit: input.unit,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %ingredient.id, name = %ingredient.name, "Creating ingredient");

        sqlx::query(
            "INSERT INTO ingredients (id, name, kind, quantity, unit, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(&ingredient.kind)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// Gets an ingredient by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!("{SELECT_INGREDIENT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ingredient)
    }

    /// Gets an ingredient by its exact (trimmed) name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Ingredient>> {
        let ingredient =
            sqlx::query_as::<_, Ingredient>(&format!("{SELECT_INGREDIENT} WHERE name = ?1"))
                .bind(name.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(ingredient)
    }

    /// Lists all ingredients ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Ingredient>> {
        let ingredients =
            sqlx::query_as::<_, Ingredient>(&format!("{SELECT_INGREDIENT} ORDER BY name, id"))
                .fetch_all(&self.pool)
                .await?;

        debug!(count = ingredients.len(), "Listed ingredients");
        Ok(ingredients)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Updates the supplied fields of an ingredient.
    ///
    /// ## Returns
    /// * `Ok(Ingredient)` - The record after the update
    /// * `Err(DbError::NotFound)` - Unknown id
    /// * `Err(DbError::UniqueViolation)` - New name belongs to another ingredient
    pub async fn update(&self, id: &str, patch: &IngredientPatch) -> DbResult<Ingredient> {
        let patch = patch.validated()?;

        let mut ingredient = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Ingredient", id))?;

        if let Some(name) = patch.name {
            if name != ingredient.name {
                if let Some(other) = self.get_by_name(&name).await? {
                    if other.id != ingredient.id {
                        return Err(DbError::duplicate("name", name));
                    }
                }
            }
            ingredient.name = name;
        }
        if let Some(kind) = patch.kind {
            ingredient.kind = kind;
        }
        if let Some(quantity) = patch.quantity {
            ingredient.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            ingredient.unit = unit;
        }
        ingredient.updated_at = Utc::now();

        debug!(id = %id, name = %ingredient.name, "Updating ingredient");

        sqlx::query(
            "UPDATE ingredients SET name = ?1, kind = ?2, quantity = ?3, unit = ?4, updated_at = ?5 \
             WHERE id = ?6",
        )
        .bind(&ingredient.name)
        .bind(&ingredient.kind)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .bind(ingredient.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// Deletes an ingredient that no menu uses.
    ///
    /// ## Returns
    /// * `Ok(true)` - Deleted
    /// * `Ok(false)` - No such ingredient
    /// * `Err(DbError::InUse)` - Still part of at least one menu
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let Some(ingredient) = self.get(id).await? else {
            return Ok(false);
        };

        let menus: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM menu_ingredients WHERE ingredient_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if menus > 0 {
            warn!(id = %id, name = %ingredient.name, menus, "Refusing to delete ingredient in use");
            return Err(DbError::InUse {
                entity: "Ingredient".to_string(),
                name: ingredient.name,
                referenced_by: "menu(s)".to_string(),
                count: menus,
            });
        }

        debug!(id = %id, name = %ingredient.name, "Deleting ingredient");

        let result = sqlx::query("DELETE FROM ingredients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};
    use bistro_core::{IngredientQuantities, NewMenu, ValidationError};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn flour() -> NewIngredient {
        NewIngredient::new("Flour", "Cereal", 10.0, "kg")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = db.ingredients();

        let created = repo.create(&flour()).await.unwrap();
        assert_eq!(created.name, "Flour");

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.kind, "Cereal");
        assert_eq!(fetched.quantity, 10.0);
        assert_eq!(fetched.unit, "kg");

        assert_eq!(repo.get_by_name(" Flour ").await.unwrap().unwrap().id, created.id);
        assert!(repo.get("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_trims_input() {
        let db = setup().await;
        let created = db
            .ingredients()
            .create(&NewIngredient::new("  Salt ", " Seasoning ", 1.5, " g "))
            .await
            .unwrap();

        assert_eq!(created.name, "Salt");
        assert_eq!(created.kind, "Seasoning");
        assert_eq!(created.unit, "g");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_without_mutation() {
        let db = setup().await;
        let repo = db.ingredients();
        let original = repo.create(&flour()).await.unwrap();

        let err = repo
            .create(&NewIngredient::new("Flour", "Other", 99.0, "g"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].quantity, original.quantity);
        assert_eq!(all[0].kind, "Cereal");
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = setup().await;
        let repo = db.ingredients();

        let err = repo
            .create(&NewIngredient::new("Flour", "Cereal", 0.0, "kg"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::MustBePositive { .. })
        ));

        let err = repo
            .create(&NewIngredient::new("", "Cereal", 1.0, "kg"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let db = setup().await;
        let repo = db.ingredients();
        for name in ["Tomato", "Basil", "Mozzarella"] {
            repo.create(&NewIngredient::new(name, "Vegetable", 1.0, "kg"))
                .await
                .unwrap();
        }

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Basil", "Mozzarella", "Tomato"]);
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let db = setup().await;
        let repo = db.ingredients();
        let created = repo.create(&flour()).await.unwrap();

        let patch = IngredientPatch {
            quantity: Some(4.5),
            ..Default::default()
        };
        let updated = repo.update(&created.id, &patch).await.unwrap();

        assert_eq!(updated.quantity, 4.5);
        assert_eq!(updated.name, "Flour");
        assert_eq!(updated.unit, "kg");
        assert!(updated.updated_at >= created.updated_at);

        let stored = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 4.5);
    }

    #[tokio::test]
    async fn test_update_rename_conflict_and_missing() {
        let db = setup().await;
        let repo = db.ingredients();
        repo.create(&flour()).await.unwrap();
        let sugar = repo
            .create(&NewIngredient::new("Sugar", "Other", 2.0, "kg"))
            .await
            .unwrap();

        let rename = IngredientPatch {
            name: Some("Flour".to_string()),
            ..Default::default()
        };
        let err = repo.update(&sugar.id, &rename).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.get(&sugar.id).await.unwrap().unwrap().name, "Sugar");

        // Keeping its own name is fine
        let same = IngredientPatch {
            name: Some("Sugar".to_string()),
            ..Default::default()
        };
        assert!(repo.update(&sugar.id, &same).await.is_ok());

        let err = repo.update("missing", &same).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let repo = db.ingredients();
        let created = repo.create(&flour()).await.unwrap();

        assert!(repo.delete(&created.id).await.unwrap());
        assert!(repo.get(&created.id).await.unwrap().is_none());
        assert!(!repo.delete(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_in_use_is_rejected() {
        let db = setup().await;
        let flour = db.ingredients().create(&flour()).await.unwrap();

        let mut ingredients = IngredientQuantities::new();
        ingredients.insert(flour.id.clone(), 0.2);
        let bread = db
            .menus()
            .create(&NewMenu {
                name: "Bread".to_string(),
                description: None,
                price_cents: 500,
                ingredients,
            })
            .await
            .unwrap();

        let err = db.ingredients().delete(&flour.id).await.unwrap_err();
        assert!(matches!(err, DbError::InUse { count: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert!(db.ingredients().get(&flour.id).await.unwrap().is_some());
        assert_eq!(db.menus().ingredients(&bread.id).await.unwrap().len(), 1);
    }
}
