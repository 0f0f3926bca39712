//! Route classification policy.
//!
//! Classification is a pure function of the path string alone - never of the
//! method, headers, or body - so it is deterministic and cache-safe.
//!
//! The protected set is an explicit allow-list: paths named in neither list
//! are public by default. A new protected route must be added to
//! `PROTECTED_PREFIXES` or it ships unauthenticated.

/// Policy class assigned to a request path. Every path maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Never requires a token.
    Public,
    /// Public, but a request that already carries a valid session is
    /// redirected to the home path instead of re-rendering the login page.
    LoginPage,
    /// Requires a valid token; failures redirect to the login page.
    ProtectedPage,
    /// Requires a valid token; failures get a structured 401, never a redirect.
    ProtectedApi,
}

/// Paths that never require a session: static assets, the login page, the
/// readme, and the session endpoints themselves.
const PUBLIC_PREFIXES: &[&str] = &["/assets", "/login", "/readme", "/api/login", "/api/logout", "/api/session"];

/// The authenticated surface, plus the root path handled separately below.
const PROTECTED_PREFIXES: &[&str] = &["/advanced", "/api/write-to-file", "/api/read-file"];

pub fn classify(path: &str) -> RouteClass {
    if path.starts_with("/login") {
        return RouteClass::LoginPage;
    }
    if path == "/favicon.ico" || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return RouteClass::Public;
    }

    let protected = path.is_empty() || path == "/" || PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix));
    if !protected {
        // Default-allow: anything not explicitly listed is public
        return RouteClass::Public;
    }

    if is_api_path(path) { RouteClass::ProtectedApi } else { RouteClass::ProtectedPage }
}

/// True iff the path is the API root or below it.
///
/// This, not [`classify`], is authoritative for the failure shape: an
/// API-shaped path gets 401 semantics even if it sits under a page-protected
/// prefix.
pub fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Normalize the `from` parameter a login redirect carried.
///
/// Guarantees a leading slash, strips a duplicated base path exactly once,
/// and falls back to the root when empty.
pub fn normalize_from(from: &str, base_path: &str) -> String {
    if from.is_empty() {
        return "/".to_string();
    }

    let path = if from.starts_with('/') { from.to_string() } else { format!("/{from}") };

    if !base_path.is_empty() && path.starts_with(base_path) {
        let stripped = &path[base_path.len()..];
        if stripped.is_empty() {
            return "/".to_string();
        }
        return stripped.to_string();
    }

    path
}
