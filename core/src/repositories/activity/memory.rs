//! In-memory session activity trail

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{SessionAction, SessionActivity};
use crate::errors::StoreError;

use super::SessionActivityRepository;

/// Activity trail held in memory in insertion order
#[derive(Clone, Default)]
pub struct InMemorySessionActivityRepository {
    records: Arc<RwLock<Vec<SessionActivity>>>,
}

impl InMemorySessionActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record with the given action
    pub async fn with_action(&self, action: SessionAction) -> Vec<SessionActivity> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.action == action)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SessionActivityRepository for InMemorySessionActivityRepository {
    async fn record(&self, activity: &SessionActivity) -> Result<(), StoreError> {
        self.records.write().await.push(activity.clone());
        Ok(())
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<SessionActivity>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn find_by_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<SessionActivity>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_records_are_queryable() {
        let repo = InMemorySessionActivityRepository::new();
        let session_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        repo.record(&SessionActivity::new(session_id, user_id, SessionAction::Login, Utc::now()))
            .await
            .unwrap();
        repo.record(&SessionActivity::new(session_id, user_id, SessionAction::Refresh, Utc::now()))
            .await
            .unwrap();

        assert_eq!(repo.find_by_session(session_id).await.unwrap().len(), 2);
        let latest = repo.find_by_user(user_id, 1).await.unwrap();
        assert_eq!(latest[0].action, SessionAction::Refresh);
        assert_eq!(repo.with_action(SessionAction::Login).await.len(), 1);
    }
}
