//! `Set-Cookie` values for delivering the refresh token.

use tg_shared::config::RefreshCookieConfig;

/// A rendered refresh-token cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCookie {
    pub name: String,
    pub value: String,
    pub max_age: i64,
    config: RefreshCookieConfig,
}

impl RefreshCookie {
    /// Cookie carrying `token` for `max_age` seconds
    pub fn new(config: &RefreshCookieConfig, token: impl Into<String>, max_age: i64) -> Self {
        Self {
            name: config.name.clone(),
            value: token.into(),
            max_age,
            config: config.clone(),
        }
    }

    /// Cookie instructing the client to drop the refresh token
    pub fn cleared(config: &RefreshCookieConfig) -> Self {
        Self::new(config, "", -1)
    }

    /// Value of the `Set-Cookie` header
    pub fn header_value(&self) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, self.value),
            format!("Path={}", self.config.path),
        ];
        if let Some(domain) = &self.config.domain {
            parts.push(format!("Domain={}", domain));
        }
        // Max-Age=0 is the portable way to expire immediately
        parts.push(format!("Max-Age={}", self.max_age.max(0)));
        if self.config.http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.config.secure {
            parts.push("Secure".to_string());
        }
        parts.push(format!("SameSite={}", self.config.same_site));
        parts.join("; ")
    }
}

impl std::fmt::Display for RefreshCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.header_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        let cookie = RefreshCookie::new(&RefreshCookieConfig::default(), "abc", 604800);
        assert_eq!(
            cookie.header_value(),
            "refresh_token=abc; Path=/api/v1/auth/refresh; Max-Age=604800; HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn test_cleared_cookie() {
        let config = RefreshCookieConfig {
            domain: Some("example.com".to_string()),
            secure: false,
            ..Default::default()
        };
        let cookie = RefreshCookie::cleared(&config);
        assert_eq!(
            cookie.to_string(),
            "refresh_token=; Path=/api/v1/auth/refresh; Domain=example.com; Max-Age=0; HttpOnly; SameSite=Strict"
        );
    }
}
