//! Cookie header parsing and `Set-Cookie` construction.

use axum::http::{header, HeaderMap, HeaderValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::HashMap;
use std::time::Duration;

/// Characters escaped in cookie values.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b':')
    .add(b';')
    .add(b'\\');

/// Parse a `Cookie` request header into a name → value map.
///
/// Values are percent-decoded. Pairs without `=` or with an empty name are
/// skipped. If a name repeats, the first occurrence wins (browsers send the
/// most specific path first).
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"');
        let value = percent_decode_str(value)
            .decode_utf8()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        cookies.entry(name.to_string()).or_insert(value);
    }
    cookies
}

/// Read a single cookie from the request headers.
///
/// All `Cookie` headers are consulted (HTTP/2 may split them).
pub fn cookie_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| parse_cookie_header(raw).remove(name))
}

/// Builder for an HttpOnly, SameSite=Lax `Set-Cookie` header.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: &'static str,
    value: String,
    max_age: Duration,
    secure: bool,
}

impl SetCookie {
    pub fn new(name: &'static str, value: &str, max_age: Duration) -> Self {
        Self {
            name,
            value: value.to_string(),
            max_age,
            secure: false,
        }
    }

    /// A cookie that tells the browser to drop `name` immediately.
    pub fn expire(name: &'static str) -> Self {
        Self::new(name, "", Duration::ZERO)
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn to_header_value(&self) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE),
            self.max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        // Name is a static identifier and the value is percent-encoded, so
        // the header is always visible ASCII.
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}
