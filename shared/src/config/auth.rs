//! Authentication, session policy and refresh cookie configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "tollgate-secret-change-in-production";

/// JWT signing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret used to sign access tokens
    pub access_secret: String,

    /// Secret used to sign refresh tokens.
    ///
    /// When absent the refresh secret is derived from `access_secret`, so the
    /// two token kinds never share a signing key.
    #[serde(default)]
    pub refresh_secret: Option<String>,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl: i64,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Clock skew tolerated when checking `exp` and `nbf`, in seconds
    #[serde(default)]
    pub leeway: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::from(DEFAULT_SECRET),
            refresh_secret: None,
            access_token_ttl: default_access_ttl(),
            refresh_token_ttl: default_refresh_ttl(),
            issuer: default_issuer(),
            leeway: 0,
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with an access secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            access_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Use a dedicated refresh secret instead of deriving one
    pub fn with_refresh_secret(mut self, secret: impl Into<String>) -> Self {
        self.refresh_secret = Some(secret.into());
        self
    }

    /// Set access token lifetime in minutes
    pub fn with_access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl = minutes * 60;
        self
    }

    /// Set refresh token lifetime in days
    pub fn with_refresh_ttl_days(mut self, days: i64) -> Self {
        self.refresh_token_ttl = days * 86400;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.access_secret == DEFAULT_SECRET
    }
}

/// Which sessions are revoked when an already rotated refresh token is replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReuseRevocationScope {
    /// Every session descending from the same login
    Family,
    /// Every session of the user
    User,
}

impl Default for ReuseRevocationScope {
    fn default() -> Self {
        ReuseRevocationScope::Family
    }
}

/// Session lifecycle policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionPolicyConfig {
    /// Revoke a user's other sessions on every successful login
    #[serde(default)]
    pub single_session: bool,

    /// Minimum seconds between two successful refreshes of one session
    #[serde(default = "default_min_refresh_interval")]
    pub min_refresh_interval: i64,

    /// Session age in seconds after which a refresh rotates the token
    #[serde(default = "default_rotation_age")]
    pub rotation_age: i64,

    /// Refresh count after which a refresh rotates the token
    #[serde(default = "default_rotation_refresh_count")]
    pub rotation_refresh_count: u32,

    /// Rotate on every refresh
    #[serde(default)]
    pub always_rotate: bool,

    /// Revoke the session and force a new login when a refresh looks anomalous
    #[serde(default)]
    pub revoke_on_anomaly: bool,

    /// Revocation scope applied on refresh token reuse
    #[serde(default)]
    pub reuse_revocation_scope: ReuseRevocationScope,

    /// Upper bound for a single storage call, in milliseconds
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,

    /// IPv4 prefix length treated as the same network
    #[serde(default = "default_ipv4_prefix")]
    pub ipv4_prefix: u8,

    /// IPv6 prefix length treated as the same network
    #[serde(default = "default_ipv6_prefix")]
    pub ipv6_prefix: u8,

    /// Major version difference tolerated between user agents
    #[serde(default = "default_user_agent_drift")]
    pub user_agent_major_drift: u32,
}

impl Default for SessionPolicyConfig {
    fn default() -> Self {
        Self {
            single_session: false,
            min_refresh_interval: default_min_refresh_interval(),
            rotation_age: default_rotation_age(),
            rotation_refresh_count: default_rotation_refresh_count(),
            always_rotate: false,
            revoke_on_anomaly: false,
            reuse_revocation_scope: ReuseRevocationScope::default(),
            storage_timeout_ms: default_storage_timeout_ms(),
            ipv4_prefix: default_ipv4_prefix(),
            ipv6_prefix: default_ipv6_prefix(),
            user_agent_major_drift: default_user_agent_drift(),
        }
    }
}

/// Attributes of the cookie carrying the refresh token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RefreshCookieConfig {
    /// Cookie name
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Path the cookie is scoped to
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// Optional cookie domain
    #[serde(default)]
    pub domain: Option<String>,

    /// Send only over HTTPS
    #[serde(default = "default_true")]
    pub secure: bool,

    /// Hide from scripts
    #[serde(default = "default_true")]
    pub http_only: bool,

    /// SameSite attribute
    #[serde(default = "default_same_site")]
    pub same_site: String,
}

impl Default for RefreshCookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: default_same_site(),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Session policy
    #[serde(default)]
    pub session: SessionPolicyConfig,

    /// Refresh cookie attributes
    #[serde(default)]
    pub cookie: RefreshCookieConfig,
}

fn default_access_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_ttl() -> i64 {
    604800 // 7 days
}

fn default_issuer() -> String {
    String::from("tollgate")
}

fn default_min_refresh_interval() -> i64 {
    10
}

fn default_rotation_age() -> i64 {
    86400 // 24 hours
}

fn default_rotation_refresh_count() -> u32 {
    10
}

fn default_storage_timeout_ms() -> u64 {
    5000
}

fn default_ipv4_prefix() -> u8 {
    24
}

fn default_ipv6_prefix() -> u8 {
    48
}

fn default_user_agent_drift() -> u32 {
    1
}

fn default_cookie_name() -> String {
    String::from("refresh_token")
}

fn default_cookie_path() -> String {
    String::from("/api/v1/auth/refresh")
}

fn default_same_site() -> String {
    String::from("Strict")
}

fn default_true() -> bool {
    true
}
