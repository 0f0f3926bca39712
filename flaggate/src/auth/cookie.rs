//! The cookie carrier binding a session token to the browser.
//!
//! The cookie is transport only - the token's own signature and expiry are
//! the source of truth, the cookie just replays it on subsequent requests.

use axum::http::{HeaderMap, header};

use crate::config::Config;

/// Build the Set-Cookie value carrying a freshly issued token.
///
/// Max-Age mirrors the token's own expiry.
pub fn session_cookie(token: &str, config: &Config) -> String {
    cookie_with(token, config.auth.session.timeout.as_secs(), config)
}

/// Overwrite with an empty value and zero lifetime to discard the session.
pub fn clear_cookie(config: &Config) -> String {
    cookie_with("", 0, config)
}

fn cookie_with(value: &str, max_age: u64, config: &Config) -> String {
    let session = &config.auth.session;
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        session.cookie_name,
        value,
        config.cookie_path(),
        max_age,
        same_site_attr(&session.cookie_same_site)
    );
    if session.cookie_http_only {
        cookie.push_str("; HttpOnly");
    }
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn same_site_attr(value: &str) -> &'static str {
    match value {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// Extract the session token from a request's Cookie header, if present.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name == cookie_name {
                return Some(value);
            }
        }
    }
    None
}
