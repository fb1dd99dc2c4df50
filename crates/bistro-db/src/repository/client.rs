//! # Client Repository
//!
//! Database operations for clients, keyed on a unique email.
//!
//! Deleting a client keeps its orders; their `client_id` becomes NULL so the
//! sales history stays intact.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::{new_id, Client, ClientPatch, NewClient};

const SELECT_CLIENT: &str = "SELECT id, name, email, created_at, updated_at FROM clients";

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Creates a client.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - Blank name, malformed email
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn create(&self, input: &NewClient) -> DbResult<Client> {
        let input = input.validated()?;

        if self.get_by_email(&input.email).await?.is_some() {
            return Err(DbError::duplicate("email", &input.email));
        }

        let now = Utc::now();
        let client = Client {
            id: new_id(),
            name: input.name,
            email: input.email,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %client.id, email = %client.email, "Creating client");

        sqlx::query(
            "INSERT INTO clients (id, name, email, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!("{SELECT_CLIENT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!("{SELECT_CLIENT} WHERE email = ?1"))
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    /// Lists all clients ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!("{SELECT_CLIENT} ORDER BY name, email"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = clients.len(), "Listed clients");
        Ok(clients)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Updates the supplied fields of a client.
    pub async fn update(&self, id: &str, patch: &ClientPatch) -> DbResult<Client> {
        let patch = patch.validated()?;

        let mut client = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))?;

        if let Some(name) = patch.name {
            client.name = name;
        }
        if let Some(email) = patch.email {
            if email != client.email {
                if let Some(other) = self.get_by_email(&email).await? {
                    if other.id != client.id {
                        return Err(DbError::duplicate("email", email));
                    }
                }
            }
            client.email = email;
        }
        client.updated_at = Utc::now();

        debug!(id = %id, email = %client.email, "Updating client");

        sqlx::query("UPDATE clients SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&client.name)
            .bind(&client.email)
            .bind(client.updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(client)
    }

    /// Deletes a client. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
