// Cookie parsing and session-token extraction.

use std::collections::HashMap;

use http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};

/// Cookie prefixes for secure contexts.
pub const SECURE_COOKIE_PREFIX: &str = "__Secure-";
pub const HOST_COOKIE_PREFIX: &str = "__Host-";

/// SameSite cookie attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes of a `Set-Cookie` header.
#[derive(Debug, Clone)]
pub struct CookieAttributes {
    pub value: String,
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieAttributes {
    /// Attributes of the session-token cookie.
    pub fn session(value: impl Into<String>, max_age: i64, secure: bool) -> Self {
        Self {
            value: value.into(),
            max_age: Some(max_age),
            path: Some("/".to_string()),
            secure,
            http_only: true,
            same_site: Some(SameSite::Lax),
        }
    }

    /// Attributes that make the browser drop the cookie.
    pub fn expired(secure: bool) -> Self {
        Self::session(String::new(), 0, secure)
    }
}

/// Serialize a cookie into a `Set-Cookie` header value.
pub fn serialize_cookie(name: &str, attrs: &CookieAttributes) -> String {
    let mut parts = vec![format!("{}={}", name, attrs.value)];

    if let Some(max_age) = attrs.max_age {
        parts.push(format!("Max-Age={max_age}"));
    }
    if let Some(ref path) = attrs.path {
        parts.push(format!("Path={path}"));
    }
    if attrs.secure {
        parts.push("Secure".into());
    }
    if attrs.http_only {
        parts.push("HttpOnly".into());
    }
    if let Some(same_site) = attrs.same_site {
        parts.push(format!("SameSite={same_site}"));
    }

    parts.join("; ")
}

/// Append a `Set-Cookie` header to `headers`. Unrepresentable values are dropped.
pub fn append_set_cookie(headers: &mut HeaderMap, name: &str, attrs: &CookieAttributes) {
    if let Ok(value) = HeaderValue::from_str(&serialize_cookie(name, attrs)) {
        headers.append(SET_COOKIE, value);
    }
}

/// Remove __Secure- or __Host- prefix from a cookie name.
pub fn strip_secure_cookie_prefix(cookie_name: &str) -> &str {
    if let Some(rest) = cookie_name.strip_prefix(SECURE_COOKIE_PREFIX) {
        return rest;
    }
    if let Some(rest) = cookie_name.strip_prefix(HOST_COOKIE_PREFIX) {
        return rest;
    }
    cookie_name
}

/// Parse a `Cookie` header string into a map of name → value.
pub fn parse_cookies(cookie_header: &str) -> HashMap<String, String> {
    cookie_header
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Extract the session token from the request headers.
///
/// `Authorization: Bearer <token>` wins; otherwise the cookie named
/// `cookie_name` is read, accepting its `__Secure-` variant as well. Every
/// `Cookie` header is consulted.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let plain_name = strip_secure_cookie_prefix(cookie_name);
    let secure_name = format!("{SECURE_COOKIE_PREFIX}{plain_name}");

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| {
            let cookies = parse_cookies(header);
            cookies
                .get(cookie_name)
                .or_else(|| cookies.get(&secure_name))
                .or_else(|| cookies.get(plain_name))
                .cloned()
        })
        .filter(|t| !t.is_empty())
}
