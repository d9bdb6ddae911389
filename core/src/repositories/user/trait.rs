//! Read-only view of the user directory needed by the auth core.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Principal, UserAccount};
use crate::errors::StoreError;

/// Lookup of users owned by the user-management side
///
/// Implementations match emails case-insensitively; callers pass the
/// normalised (trimmed, lowercase) form.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Find the account for a login email
    ///
    /// # Returns
    /// * `Ok(Some(UserAccount))` - User found, with its password hash
    /// * `Ok(None)` - No user with that email
    /// * `Err(StoreError)` - Backend failure
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Find a principal by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError>;
}
