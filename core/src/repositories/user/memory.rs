//! In-memory user directory

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Principal, UserAccount};
use crate::errors::StoreError;

use super::r#trait::UserLookup;

/// User directory held in memory, keyed by id
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, UserAccount>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user
    pub async fn insert(&self, principal: Principal, password_hash: impl Into<String>) {
        let account = UserAccount {
            principal,
            password_hash: password_hash.into(),
        };
        self.users.write().await.insert(account.principal.id, account);
    }

    /// Flip the active flag; returns false for unknown ids
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> bool {
        match self.users.write().await.get_mut(&id) {
            Some(account) => {
                account.principal.is_active = is_active;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<UserAccount> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|account| account.principal.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        Ok(self.users.read().await.get(&id).map(|account| account.principal.clone()))
    }
}
