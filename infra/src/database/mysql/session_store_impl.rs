//! MySQL implementation of the SessionStore trait.
//!
//! Sessions live in the `sessions` table keyed by id, with a unique index on
//! the refresh token hash. Conditional writes rely on `revoked_at IS NULL`
//! and `refresh_count` predicates; rotation runs in one transaction holding a
//! row lock on the superseded session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Transaction};
use uuid::Uuid;

use tg_core::domain::entities::{Session, SessionMetadataUpdate};
use tg_core::errors::StoreError;
use tg_core::repositories::SessionStore;

use super::{column, map_sqlx_error, optional_uuid_column, uuid_column};

const SELECT_SESSION: &str = r#"
    SELECT id, user_id, refresh_token_hash, family_id, parent_session_id,
           ip_address, user_agent, device_info, last_ip, last_user_agent,
           last_used_at, refresh_count, created_at, expires_at, revoked_at,
           rotated_at, was_rotated
    FROM sessions
"#;

const INSERT_SESSION: &str = r#"
    INSERT INTO sessions (
        id, user_id, refresh_token_hash, family_id, parent_session_id,
        ip_address, user_agent, device_info, last_ip, last_user_agent,
        last_used_at, refresh_count, created_at, expires_at, revoked_at,
        rotated_at, was_rotated
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// MySQL implementation of SessionStore
pub struct MySqlSessionStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlSessionStore {
    /// Create a new MySQL session store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to Session entity
    fn row_to_session(row: &MySqlRow) -> Result<Session, StoreError> {
        Ok(Session {
            id: uuid_column(row, "id")?,
            user_id: uuid_column(row, "user_id")?,
            refresh_token_hash: column(row, "refresh_token_hash")?,
            family_id: uuid_column(row, "family_id")?,
            parent_session_id: optional_uuid_column(row, "parent_session_id")?,
            ip_address: column(row, "ip_address")?,
            user_agent: column(row, "user_agent")?,
            device_info: column(row, "device_info")?,
            last_ip: column(row, "last_ip")?,
            last_user_agent: column(row, "last_user_agent")?,
            last_used_at: column(row, "last_used_at")?,
            refresh_count: column(row, "refresh_count")?,
            created_at: column(row, "created_at")?,
            expires_at: column(row, "expires_at")?,
            revoked_at: column(row, "revoked_at")?,
            rotated_at: column(row, "rotated_at")?,
            was_rotated: column(row, "was_rotated")?,
        })
    }

    async fn fetch_one_where(&self, operation: &'static str, predicate: &str, value: String) -> Result<Session, StoreError> {
        let sql = format!("{} WHERE {} = ?", SELECT_SESSION, predicate);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        match row {
            Some(row) => Self::row_to_session(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn exists(&self, session_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("session_exists", e))?;
        Ok(row.is_some())
    }

    async fn insert(
        executor: &mut Transaction<'_, MySql>,
        session: &Session,
    ) -> Result<(), StoreError> {
        Self::bind_insert(session)
            .execute(&mut **executor)
            .await
            .map_err(|e| map_sqlx_error("insert_session", e))?;
        Ok(())
    }

    fn bind_insert(session: &Session) -> sqlx::query::Query<'static, MySql, sqlx::mysql::MySqlArguments> {
        sqlx::query(INSERT_SESSION)
            .bind(session.id.to_string())
            .bind(session.user_id.to_string())
            .bind(session.refresh_token_hash.clone())
            .bind(session.family_id.to_string())
            .bind(session.parent_session_id.map(|id| id.to_string()))
            .bind(session.ip_address.clone())
            .bind(session.user_agent.clone())
            .bind(session.device_info.clone())
            .bind(session.last_ip.clone())
            .bind(session.last_user_agent.clone())
            .bind(session.last_used_at)
            .bind(session.refresh_count)
            .bind(session.created_at)
            .bind(session.expires_at)
            .bind(session.revoked_at)
            .bind(session.rotated_at)
            .bind(session.was_rotated)
    }
}

#[async_trait]
impl SessionStore for MySqlSessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        Self::bind_insert(session)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_session", e))?;

        tracing::debug!(session_id = %session.id, user_id = %session.user_id, "Session created");
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Session, StoreError> {
        self.fetch_one_where("find_session_by_token_hash", "refresh_token_hash", token_hash.to_string())
            .await
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Session, StoreError> {
        self.fetch_one_where("find_session_by_id", "id", session_id.to_string())
            .await
    }

    async fn list_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError> {
        let sql = format!(
            "{} WHERE user_id = ? AND revoked_at IS NULL AND expires_at >= ? ORDER BY created_at DESC",
            SELECT_SESSION
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_active_sessions", e))?;

        rows.iter().map(Self::row_to_session).collect()
    }

    async fn revoke(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
            .bind(at)
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_session", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if self.exists(session_id).await? {
            Ok(false)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL")
            .bind(at)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_user_sessions", e))?;

        Ok(result.rows_affected())
    }

    async fn revoke_family(&self, family_id: Uuid, at: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = ? WHERE family_id = ? AND revoked_at IS NULL")
            .bind(at)
            .bind(family_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_session_family", e))?;

        Ok(result.rows_affected())
    }

    async fn update_metadata(&self, session_id: Uuid, update: &SessionMetadataUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET last_used_at = ?, last_ip = ?, last_user_agent = ?, refresh_count = ?
            WHERE id = ? AND revoked_at IS NULL AND refresh_count = ?
            "#,
        )
        .bind(update.last_used_at)
        .bind(update.last_ip.clone())
        .bind(update.last_user_agent.clone())
        .bind(update.refresh_count)
        .bind(session_id.to_string())
        .bind(update.expected_refresh_count())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_session_metadata", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }
        if self.exists(session_id).await? {
            Err(StoreError::Conflict)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn rotate_atomically(&self, old_session_id: Uuid, new_session: &Session, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_rotation", e))?;

        // Serialises concurrent rotations of the same session.
        let locked = sqlx::query("SELECT revoked_at FROM sessions WHERE id = ? FOR UPDATE")
            .bind(old_session_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_session", e))?;

        let revoked_at: Option<DateTime<Utc>> = match locked {
            None => return Err(StoreError::NotFound),
            Some(row) => column(&row, "revoked_at")?,
        };
        if revoked_at.is_some() {
            return Err(StoreError::Conflict);
        }

        Self::insert(&mut tx, new_session).await?;

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked_at = ?, rotated_at = ?, was_rotated = TRUE
            WHERE id = ? AND revoked_at IS NULL
            "#,
        )
        .bind(at)
        .bind(at)
        .bind(old_session_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("mark_session_rotated", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Conflict);
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit_rotation", e))?;

        tracing::debug!(
            old_session_id = %old_session_id,
            new_session_id = %new_session.id,
            family_id = %new_session.family_id,
            "Session rotated"
        );
        Ok(())
    }
}
