//! In-process [`SessionStore`] backed by a single lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Session, SessionMetadataUpdate};
use crate::errors::StoreError;

use super::r#trait::SessionStore;

#[derive(Default)]
struct Tables {
    sessions: HashMap<Uuid, Session>,
    by_hash: HashMap<String, Uuid>,
}

impl Tables {
    fn insert(&mut self, session: &Session) -> Result<(), StoreError> {
        if self.sessions.contains_key(&session.id) || self.by_hash.contains_key(&session.refresh_token_hash) {
            return Err(StoreError::Conflict);
        }
        self.by_hash.insert(session.refresh_token_hash.clone(), session.id);
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn revoke_where(&mut self, at: DateTime<Utc>, predicate: impl Fn(&Session) -> bool) -> u64 {
        let mut changed = 0;
        for session in self.sessions.values_mut() {
            if !session.is_revoked() && predicate(session) {
                session.revoke(at);
                changed += 1;
            }
        }
        changed
    }
}

/// Session store held in memory
///
/// Every write takes the same write lock, which makes rotation and the
/// conditional metadata update atomic. Suitable for tests and single-process
/// deployments.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, revoked ones included
    pub async fn len(&self) -> usize {
        self.tables.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every row of a family, oldest first
    pub async fn family(&self, family_id: Uuid) -> Vec<Session> {
        let tables = self.tables.read().await;
        let mut family: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.family_id == family_id)
            .cloned()
            .collect();
        family.sort_by_key(|s| s.created_at);
        family
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        self.tables.write().await.insert(session)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Session, StoreError> {
        let tables = self.tables.read().await;
        tables
            .by_hash
            .get(token_hash)
            .and_then(|id| tables.sessions.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Session, StoreError> {
        self.tables
            .read()
            .await
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_active(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn revoke(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let session = tables.sessions.get_mut(&session_id).ok_or(StoreError::NotFound)?;
        if session.is_revoked() {
            return Ok(false);
        }
        session.revoke(at);
        Ok(true)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.tables.write().await.revoke_where(at, |s| s.user_id == user_id))
    }

    async fn revoke_family(&self, family_id: Uuid, at: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.tables.write().await.revoke_where(at, |s| s.family_id == family_id))
    }

    async fn update_metadata(&self, session_id: Uuid, update: &SessionMetadataUpdate) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let session = tables.sessions.get_mut(&session_id).ok_or(StoreError::NotFound)?;
        if session.is_revoked() || session.refresh_count != update.expected_refresh_count() {
            return Err(StoreError::Conflict);
        }
        session.apply(update);
        Ok(())
    }

    async fn rotate_atomically(&self, old_session_id: Uuid, new_session: &Session, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.sessions.get(&old_session_id) {
            None => return Err(StoreError::NotFound),
            Some(old) if old.is_revoked() => return Err(StoreError::Conflict),
            Some(_) => {}
        }
        tables.insert(new_session)?;
        if let Some(old) = tables.sessions.get_mut(&old_session_id) {
            old.mark_rotated(at);
        }
        Ok(())
    }
}
