//! Cache key builders for every SalesDesk cache entry.
//!
//! The Redis backend adds the configured key prefix on top of these.

/// Revocation list entry for a refresh token digest.
pub fn revoked_refresh_token(token_digest: &str) -> String {
    format!("auth:revoked:{token_digest}")
}

/// Fixed-window request counter for one client on one endpoint group.
pub fn rate_limit(scope: &str, client: &str) -> String {
    format!("ratelimit:{scope}:{client}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(revoked_refresh_token("ab12"), "auth:revoked:ab12");
        assert_eq!(rate_limit("login", "10.0.0.1"), "ratelimit:login:10.0.0.1");
    }
}
