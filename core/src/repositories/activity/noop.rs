//! No-op implementation of SessionActivityRepository for when the trail is not kept

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::SessionActivity;
use crate::errors::StoreError;

use super::SessionActivityRepository;

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSessionActivityRepository;

impl NoOpSessionActivityRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionActivityRepository for NoOpSessionActivityRepository {
    async fn record(&self, _activity: &SessionActivity) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_session(&self, _session_id: Uuid) -> Result<Vec<SessionActivity>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_by_user(&self, _user_id: Uuid, _limit: usize) -> Result<Vec<SessionActivity>, StoreError> {
        Ok(Vec::new())
    }
}
