//! Forgery-protection token lookup. The token itself is minted by the page
//! framework; the client only has to attach it to every mutating call.

use regex::Regex;

pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CsrfSource {
    /// Token handed over by the page context.
    Static(String),
    /// Token read from the named cookie in the client's cookie jar.
    Cookie(String),
    None,
}

/// Value of cookie `name` in a `Cookie:` header string (`a=1; csrftoken=xyz`).
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    let pattern = format!(r"(?:^|;\s*){}=([^;]*)", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(cookie_header)?.get(1)?.as_str().trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}
