//! Session store trait defining the persistence contract for refresh-token
//! sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{Session, SessionMetadataUpdate};
use crate::errors::StoreError;

/// Persistence contract for [`Session`] rows
///
/// Sessions are keyed by the SHA-256 hash of their refresh token. Rows are
/// only ever revoked, never deleted.
///
/// # Concurrency
/// - [`rotate_atomically`](SessionStore::rotate_atomically) must mark the old
///   row rotated and insert the new row as one unit, conditioned on the old
///   row still being unrevoked.
/// - [`update_metadata`](SessionStore::update_metadata) is a compare-and-set
///   on `refresh_count`.
///
/// A lost race in either is reported as [`StoreError::Conflict`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session
    ///
    /// # Returns
    /// * `Ok(())` - Session stored
    /// * `Err(StoreError::Conflict)` - A session with the same id or token hash exists
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    /// Find a session by the hash of its refresh token
    ///
    /// Returns revoked and expired rows too; classifying them is the
    /// caller's job.
    ///
    /// # Example
    /// ```no_run
    /// # use tg_core::repositories::SessionStore;
    /// # use tg_core::services::token::hash_token;
    /// # async fn example(store: &impl SessionStore) -> Result<(), Box<dyn std::error::Error>> {
    /// let session = store.find_by_token_hash(&hash_token("raw-refresh-token")).await?;
    /// println!("session {} belongs to {}", session.id, session.user_id);
    /// # Ok(())
    /// # }
    /// ```
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Session, StoreError>;

    /// Find a session by id
    async fn find_by_id(&self, session_id: Uuid) -> Result<Session, StoreError>;

    /// Unrevoked, unexpired sessions of a user, newest first
    async fn list_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError>;

    /// Revoke one session
    ///
    /// # Returns
    /// * `Ok(true)` - The session was active and is now revoked
    /// * `Ok(false)` - The session was already revoked
    /// * `Err(StoreError::NotFound)` - No such session
    async fn revoke(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Revoke every unrevoked session of a user, returning how many changed
    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Revoke every unrevoked session of a rotation family, returning how many changed
    async fn revoke_family(&self, family_id: Uuid, at: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Apply an in-place refresh
    ///
    /// # Returns
    /// * `Err(StoreError::Conflict)` - The session is revoked or its
    ///   `refresh_count` moved since it was read
    async fn update_metadata(&self, session_id: Uuid, update: &SessionMetadataUpdate) -> Result<(), StoreError>;

    /// Supersede `old_session_id` with `new_session`
    ///
    /// Marks the old row revoked and rotated at `at` and inserts the new row,
    /// or does neither.
    ///
    /// # Returns
    /// * `Err(StoreError::Conflict)` - The old session was already revoked
    async fn rotate_atomically(&self, old_session_id: Uuid, new_session: &Session, at: DateTime<Utc>) -> Result<(), StoreError>;
}
