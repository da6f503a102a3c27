//! Cookie transport for the credential pair.
//!
//! Every cookie the system writes goes through [`CookiePolicy`] so the
//! HttpOnly / SameSite / Secure attributes stay uniform.

use axum::http::header;

/// Cookie name for the access token (short-lived).
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie name for the refresh token (long-lived).
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// SameSite attribute applied to every credential cookie.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

/// Uniform attributes for every cookie write and clear in the system.
/// `secure` is derived from the configured origin scheme at startup.
#[derive(Clone, Copy, Debug)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookiePolicy {
    /// Render a Set-Cookie value for a credential cookie.
    pub fn set(&self, name: &str, value: &str, max_age: u64) -> String {
        format!(
            "{}={}; HttpOnly; SameSite={}; Path=/; Max-Age={}{}",
            name,
            value,
            self.same_site.as_str(),
            max_age,
            self.secure_suffix()
        )
    }

    /// Render a Set-Cookie value that clears a cookie.
    pub fn clear(&self, name: &str) -> String {
        format!(
            "{}=; HttpOnly; SameSite={}; Path=/; Max-Age=0{}",
            name,
            self.same_site.as_str(),
            self.secure_suffix()
        )
    }

    fn secure_suffix(&self) -> &'static str {
        if self.secure { "; Secure" } else { "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken=abc123"));

        assert_eq!(get_cookie(&headers, "accessToken"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; accessToken=abc123; refreshToken=xyz789"),
        );

        assert_eq!(get_cookie(&headers, "accessToken"), Some("abc123"));
        assert_eq!(get_cookie(&headers, "refreshToken"), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, "accessToken"), None);
    }

    #[test]
    fn test_get_cookie_no_header() {
        let headers = axum::http::HeaderMap::new();
        assert_eq!(get_cookie(&headers, "accessToken"), None);
    }

    #[test]
    fn test_get_cookie_with_spaces() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("  accessToken = abc123  ; foo=bar"),
        );

        assert_eq!(get_cookie(&headers, "accessToken"), Some("abc123"));
    }

    #[test]
    fn test_set_cookie_attributes() {
        let policy = CookiePolicy {
            secure: false,
            same_site: SameSite::Lax,
        };
        assert_eq!(
            policy.set(ACCESS_COOKIE_NAME, "tok", 3600),
            "accessToken=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600"
        );
    }

    #[test]
    fn test_secure_policy_appends_secure_flag() {
        let policy = CookiePolicy {
            secure: true,
            same_site: SameSite::Strict,
        };
        let rendered = policy.set(REFRESH_COOKIE_NAME, "tok", 60);
        assert!(rendered.ends_with("; Secure"));
        assert!(rendered.contains("SameSite=Strict"));
    }

    #[test]
    fn test_clear_cookie_zeroes_max_age() {
        let policy = CookiePolicy {
            secure: false,
            same_site: SameSite::Lax,
        };
        assert_eq!(
            policy.clear(REFRESH_COOKIE_NAME),
            "refreshToken=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
        );
    }
}
