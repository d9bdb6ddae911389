//! MySQL implementation of the UserLookup trait.
//!
//! Reads the `users` table. The column collation is case-insensitive, so an
//! equality match on the normalised email finds mixed-case rows too.

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use tg_core::domain::entities::{Principal, Role, UserAccount};
use tg_core::errors::StoreError;
use tg_core::repositories::UserLookup;

use super::{column, map_sqlx_error, uuid_column};

/// MySQL implementation of UserLookup
pub struct MySqlUserLookup {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserLookup {
    /// Create a new MySQL user lookup
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_principal(row: &MySqlRow) -> Result<Principal, StoreError> {
        let role: String = column(row, "role")?;
        let role = role
            .parse::<Role>()
            .map_err(StoreError::Unavailable)?;

        Ok(Principal {
            id: uuid_column(row, "id")?,
            email: column(row, "email")?,
            name: column(row, "name")?,
            role,
            is_active: column(row, "is_active")?,
        })
    }
}

#[async_trait]
impl UserLookup for MySqlUserLookup {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash, role, is_active
            FROM users
            WHERE email = ?
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        match row {
            Some(row) => Ok(Some(UserAccount {
                principal: Self::row_to_principal(&row)?,
                password_hash: column(&row, "password_hash")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query("SELECT id, email, name, role, is_active FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(Self::row_to_principal).transpose()
    }
}
