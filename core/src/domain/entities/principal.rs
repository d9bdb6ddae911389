//! Identity of an authenticated user as seen by the auth core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// User identity plus the attributes authorization decisions depend on.
///
/// Owned by the user directory; the auth core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl Principal {
    pub fn new(id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            role,
            is_active: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A principal together with its stored password hash, as returned by an
/// email lookup during login.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub principal: Principal,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_is_admin_follows_role() {
        let id = Uuid::new_v4();
        assert!(Principal::new(id, "a@example.com", Role::Admin).is_admin());
        assert!(!Principal::new(id, "a@example.com", Role::Customer).is_admin());
        assert!(!Principal::new(id, "a@example.com", Role::Customer).deactivated().is_active);
    }
}
