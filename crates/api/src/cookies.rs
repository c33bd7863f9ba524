//! `session_token` cookie encoding and parsing.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE, header::InvalidHeaderValue};
use chrono::Duration;

pub const SESSION_COOKIE: &str = "session_token";

/// Attributes shared by every session cookie this service emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self { secure: true }
    }
}

impl CookiePolicy {
    /// `Set-Cookie` value establishing a session for `max_age`.
    pub fn session(&self, token: &str, max_age: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.render(token, max_age.num_seconds()))
    }

    /// `Set-Cookie` value that expires the session cookie immediately.
    pub fn clear(&self) -> HeaderValue {
        if self.secure {
            HeaderValue::from_static("session_token=; Path=/; Max-Age=0; HttpOnly; Secure")
        } else {
            HeaderValue::from_static("session_token=; Path=/; Max-Age=0; HttpOnly")
        }
    }

    fn render(&self, value: &str, max_age_secs: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age_secs}; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of cookie `name` across all `Cookie` headers, if present and non-empty.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(COOKIE, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn session_cookie_carries_required_attributes() {
        let value = CookiePolicy::default()
            .session("abc", Duration::hours(24))
            .unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "session_token=abc; Path=/; Max-Age=86400; HttpOnly; Secure"
        );
    }

    #[test]
    fn clearing_cookie_expires_immediately() {
        let value = CookiePolicy::default().clear();
        assert_eq!(
            value.to_str().unwrap(),
            "session_token=; Path=/; Max-Age=0; HttpOnly; Secure"
        );
    }

    #[test]
    fn insecure_policy_omits_secure() {
        let value = CookiePolicy { secure: false }.clear();
        assert!(!value.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn reads_among_other_cookies() {
        let h = headers(&["theme=dark; session_token=tok123; lang=en"]);
        assert_eq!(read(&h, SESSION_COOKIE).as_deref(), Some("tok123"));
    }

    #[test]
    fn reads_across_multiple_headers() {
        let h = headers(&["theme=dark", "session_token=tok"]);
        assert_eq!(read(&h, SESSION_COOKIE).as_deref(), Some("tok"));
    }

    #[test]
    fn missing_or_empty_is_none() {
        assert_eq!(read(&HeaderMap::new(), SESSION_COOKIE), None);
        assert_eq!(read(&headers(&["session_token="]), SESSION_COOKIE), None);
        assert_eq!(read(&headers(&["xsession_token=abc"]), SESSION_COOKIE), None);
    }
}
