//! Identity helpers for throttling keys and logs

/// Canonical form used as the throttling key: trimmed and lowercase
pub fn normalize_identity(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Masks an email for logging, keeping the first character of the local
/// part and the domain
///
/// `alice@example.com` becomes `a***@example.com`.
pub fn mask_identity(identity: &str) -> String {
    match identity.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}
