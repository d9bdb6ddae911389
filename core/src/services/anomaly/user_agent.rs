//! User agent similarity

use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

static PRODUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z][A-Za-z0-9_\-]*)/(\d+)").expect("valid regex"));

/// The user agent with every run of digits replaced by `#`
pub fn user_agent_skeleton(user_agent: &str) -> String {
    VERSION_DIGITS.replace_all(user_agent.trim(), "#").into_owned()
}

/// `(name, major)` for every `Name/Major...` product token
fn products(user_agent: &str) -> Vec<(&str, Option<u64>)> {
    PRODUCT
        .captures_iter(user_agent)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let major = caps.get(2).and_then(|m| m.as_str().parse().ok());
            Some((name, major))
        })
        .collect()
}

/// Whether two user agents describe the same client software
///
/// Skeletons must match exactly and each product's major version may move
/// by at most `major_drift`.
pub fn same_user_agent(a: &str, b: &str, major_drift: u32) -> bool {
    if user_agent_skeleton(a) != user_agent_skeleton(b) {
        return false;
    }

    let (left, right) = (products(a), products(b));
    if left.len() != right.len() {
        return false;
    }

    left.iter().zip(right.iter()).all(|((name_a, major_a), (name_b, major_b))| {
        if name_a != name_b {
            return false;
        }
        match (major_a, major_b) {
            (Some(x), Some(y)) => x.abs_diff(*y) <= u64::from(major_drift),
            _ => major_a == major_b,
        }
    })
}
