//! MySQL implementation of the SessionActivityRepository trait.
//!
//! Stores lifecycle events in the append-only `session_activity` table.

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use tg_core::domain::entities::{SessionAction, SessionActivity};
use tg_core::errors::StoreError;
use tg_core::repositories::SessionActivityRepository;

use super::{column, map_sqlx_error, uuid_column};

const SELECT_ACTIVITY: &str = r#"
    SELECT id, session_id, user_id, action, ip_address, user_agent, metadata, created_at
    FROM session_activity
"#;

/// MySQL implementation of SessionActivityRepository
pub struct MySqlSessionActivityRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlSessionActivityRepository {
    /// Create a new MySQL session activity repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_activity(row: &MySqlRow) -> Result<SessionActivity, StoreError> {
        let action: String = column(row, "action")?;
        let action = SessionAction::from_str(&action)
            .ok_or_else(|| StoreError::Unavailable(format!("Unknown session action: {}", action)))?;

        Ok(SessionActivity {
            id: uuid_column(row, "id")?,
            session_id: uuid_column(row, "session_id")?,
            user_id: uuid_column(row, "user_id")?,
            action,
            ip_address: column(row, "ip_address")?,
            user_agent: column(row, "user_agent")?,
            metadata: column(row, "metadata")?,
            created_at: column(row, "created_at")?,
        })
    }
}

#[async_trait]
impl SessionActivityRepository for MySqlSessionActivityRepository {
    async fn record(&self, activity: &SessionActivity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO session_activity (
                id, session_id, user_id, action, ip_address, user_agent, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(activity.id.to_string())
        .bind(activity.session_id.to_string())
        .bind(activity.user_id.to_string())
        .bind(activity.action.as_str())
        .bind(activity.ip_address.clone())
        .bind(activity.user_agent.clone())
        .bind(activity.metadata.clone())
        .bind(activity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_session_activity", e))?;

        Ok(())
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<SessionActivity>, StoreError> {
        let sql = format!("{} WHERE session_id = ? ORDER BY created_at ASC", SELECT_ACTIVITY);
        let rows = sqlx::query(&sql)
            .bind(session_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_activity_by_session", e))?;

        rows.iter().map(Self::row_to_activity).collect()
    }

    async fn find_by_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<SessionActivity>, StoreError> {
        let sql = format!("{} WHERE user_id = ? ORDER BY created_at DESC LIMIT ?", SELECT_ACTIVITY);
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_activity_by_user", e))?;

        rows.iter().map(Self::row_to_activity).collect()
    }
}
