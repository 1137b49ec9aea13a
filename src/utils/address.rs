//! Address normalization helpers
//!
//! Every address entering the engine passes through `normalize_address` once;
//! all comparisons and cache keys work on the canonical lowercase form.

/// Canonical form: trimmed, lowercased
pub fn normalize_address(addr: &str) -> String {
    addr.trim().to_lowercase()
}

/// Strip an optional "0x" prefix (input must already be normalized)
pub fn strip_prefix(addr: &str) -> &str {
    addr.strip_prefix("0x").unwrap_or(addr)
}

/// Check for a well-formed EVM address: "0x" + 40 hex chars
pub fn is_valid_address(addr: &str) -> bool {
    let body = match addr.strip_prefix("0x") {
        Some(b) => b,
        None => return false,
    };
    body.len() == 40 && hex::decode(body).is_ok()
}
