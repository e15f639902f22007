//! Conversion between HTTP headers and [`Cookie`] records.
//!
//! Parsing is intentionally **minimal**: `Path`, `Domain` (leading dot
//! stripped), `Expires` (kept as raw string), `SameSite`, `Secure` and
//! `HttpOnly` are picked up, everything else is ignored. No matching or
//! expiration is done here; that is up to whoever owns the HTTP semantics.

use crate::cookies::Cookie;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};

impl Cookie {
    /// Parses the value of a single `Set-Cookie` header.
    ///
    /// Returns `None` when there is no `name=value` pair or the name is empty.
    pub fn parse_set_cookie(header: &str) -> Option<Cookie> {
        let (pair, attributes) = match header.split_once(';') {
            Some((pair, rest)) => (pair, rest),
            None => (header, ""),
        };

        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim());

        for part in attributes.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((k, v)) = part.split_once('=') {
                let v = v.trim();
                match k.trim().to_ascii_lowercase().as_str() {
                    "path" => cookie.path = Some(v.to_string()),
                    "domain" => cookie.domain = Some(v.trim_start_matches('.').to_string()),
                    "expires" => cookie.expires = Some(v.to_string()),
                    "samesite" => cookie.same_site = Some(normalize_same_site(v)),
                    _ => {}
                }
            } else if part.eq_ignore_ascii_case("secure") {
                cookie.secure = true;
            } else if part.eq_ignore_ascii_case("httponly") {
                cookie.http_only = true;
            }
        }

        Some(cookie)
    }
}

// "Lax" | "Strict" | "None"; unknown values are kept as sent
fn normalize_same_site(value: &str) -> String {
    if value.eq_ignore_ascii_case("lax") {
        "Lax".to_string()
    } else if value.eq_ignore_ascii_case("strict") {
        "Strict".to_string()
    } else if value.eq_ignore_ascii_case("none") {
        "None".to_string()
    } else {
        value.to_string()
    }
}

/// Collects every parseable `Set-Cookie` header of a response, in header order.
///
/// Headers that are not valid UTF-8 or carry no cookie pair are skipped.
pub fn cookies_from_headers(headers: &HeaderMap) -> Vec<Cookie> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .filter_map(Cookie::parse_set_cookie)
        .collect()
}

/// Renders cookies as a `Cookie` request header (`a=1; b=2`).
///
/// `None` means there is nothing to send, or the rendered value is not a valid
/// header value (e.g. a cookie value containing a newline).
pub fn render_cookie_header<'a, I>(cookies: I) -> Option<HeaderValue>
where
    I: IntoIterator<Item = &'a Cookie>,
{
    let header = cookies
        .into_iter()
        .map(Cookie::pair)
        .collect::<Vec<_>>()
        .join("; ");

    if header.is_empty() {
        return None;
    }

    match HeaderValue::from_str(&header) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Cannot render {} header: {}", COOKIE, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pair_and_attributes() {
        let c = Cookie::parse_set_cookie(
            "sid=abc; Path=/app; Domain=.example.com; Secure; HttpOnly; SameSite=strict; Expires=Wed, 21 Oct 2025 07:28:00 GMT",
        )
        .unwrap();

        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "abc");
        assert_eq!(c.path.as_deref(), Some("/app"));
        assert_eq!(c.domain.as_deref(), Some("example.com"));
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(c.same_site.as_deref(), Some("Strict"));
        assert_eq!(c.expires.as_deref(), Some("Wed, 21 Oct 2025 07:28:00 GMT"));
    }

    #[test]
    fn bare_pair_has_no_attributes() {
        let c = Cookie::parse_set_cookie("theme=dark").unwrap();
        assert_eq!(c, Cookie::new("theme", "dark"));
    }

    #[test]
    fn empty_value_is_allowed_but_empty_name_is_not() {
        assert_eq!(Cookie::parse_set_cookie("gone=; Path=/").unwrap().value, "");
        assert!(Cookie::parse_set_cookie("=orphan").is_none());
        assert!(Cookie::parse_set_cookie("no-pair-here").is_none());
    }

    #[test]
    fn unknown_same_site_is_kept() {
        let c = Cookie::parse_set_cookie("a=1; SameSite=Weird").unwrap();
        assert_eq!(c.same_site.as_deref(), Some("Weird"));
    }

    #[test]
    fn collects_all_set_cookie_headers_in_order() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("=bad"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2; Secure"));
        headers.append(COOKIE, HeaderValue::from_static("ignored=1"));

        let cookies = cookies_from_headers(&headers);
        let names: Vec<_> = cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(cookies[1].secure);
    }

    #[test]
    fn renders_request_header() {
        let cookies = vec![Cookie::new("a", "1"), Cookie::new("b", "2")];
        let header = render_cookie_header(&cookies).unwrap();
        assert_eq!(header, "a=1; b=2");

        assert!(render_cookie_header(&Vec::new()).is_none());
        assert!(render_cookie_header(&[Cookie::new("a", "line\nbreak")]).is_none());
    }
}
