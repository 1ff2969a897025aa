//! Refresh token cookie handling.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use salesdesk_core::config::auth::AuthConfig;

/// Raw refresh token from the request cookie, if present and non-empty.
pub fn refresh_token(jar: &CookieJar, config: &AuthConfig) -> Option<String> {
    jar.get(&config.cookie.name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Attach the refresh cookie: HttpOnly, SameSite=Strict, Max-Age equal to
/// the refresh lifetime.
pub fn set_refresh_token(jar: CookieJar, config: &AuthConfig, token: &str) -> CookieJar {
    let max_age = time::Duration::days(config.refresh_ttl_days.min(3650) as i64);
    jar.add(build(config, token.to_string(), max_age))
}

/// Overwrite the refresh cookie with an empty, already expired one.
pub fn clear_refresh_token(jar: CookieJar, config: &AuthConfig) -> CookieJar {
    jar.add(build(config, String::new(), time::Duration::ZERO))
}

fn build(config: &AuthConfig, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((config.cookie.name.clone(), value))
        .http_only(true)
        .secure(config.cookie.secure)
        .same_site(SameSite::Strict)
        .path(config.cookie.path.clone())
        .max_age(max_age)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_hardened_attributes() {
        let config = AuthConfig::default();
        let jar = set_refresh_token(CookieJar::new(), &config, "opaque");
        let cookie = jar.get("refreshToken").unwrap();
        assert_eq!(cookie.value(), "opaque");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
        assert_eq!(refresh_token(&jar, &config).as_deref(), Some("opaque"));
    }

    #[test]
    fn cleared_cookie_is_empty_and_expired() {
        let config = AuthConfig::default();
        let jar = clear_refresh_token(CookieJar::new(), &config);
        let cookie = jar.get("refreshToken").unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert!(refresh_token(&jar, &config).is_none());
    }
}
