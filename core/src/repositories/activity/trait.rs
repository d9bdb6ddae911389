//! Repository trait for the session activity trail.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::SessionActivity;
use crate::errors::StoreError;

/// Append-only store of [`SessionActivity`] records
///
/// Writes are best-effort from the caller's point of view: a failure is
/// logged and never fails the request that produced it.
#[async_trait]
pub trait SessionActivityRepository: Send + Sync {
    /// Append one record
    async fn record(&self, activity: &SessionActivity) -> Result<(), StoreError>;

    /// Records of one session, oldest first
    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<SessionActivity>, StoreError>;

    /// Most recent records of a user, newest first
    async fn find_by_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<SessionActivity>, StoreError>;
}
