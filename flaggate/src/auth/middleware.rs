//! The request gate: classifies the path, checks the session cookie, and
//! decides whether to pass the request through, redirect it to the login
//! page, or reject it with a structured 401.
//!
//! The gate is stateless and does no I/O beyond reading the request and
//! writing the response; it is safe to run on any number of concurrent
//! requests.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::{
    AppState,
    auth::{
        cookie,
        routes::{self, RouteClass},
        session::TokenCodec,
    },
    config::Config,
};

/// Challenge attached to API-shaped rejections.
const CHALLENGE: &str = "Bearer realm=\"feature\"";

/// What the gate decided for one request.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum GateOutcome {
    /// Forward the request unchanged.
    Pass,
    /// 302 to the given location.
    Redirect(String),
    /// 401 with the structured JSON error body and challenge header.
    Unauthorized,
}

/// The decision table, evaluated in order:
///
/// 1. Login page with a valid token: redirect to the home path (no re-login
///    while already authenticated).
/// 2. Login page without a valid token, or any public path: pass through.
/// 3. Protected path without a token: reject.
/// 4. Protected path with a token: verify; pass on success, reject otherwise.
///
/// Rejection shape is chosen by `is_api_path`, not by classification, so an
/// API-shaped path under a page-protected prefix still gets 401 semantics.
/// Expired, tampered, and malformed tokens all reject identically.
pub(crate) fn evaluate(codec: &TokenCodec, config: &Config, path: &str, query: Option<&str>, token: Option<&str>) -> GateOutcome {
    match routes::classify(path) {
        RouteClass::LoginPage => {
            if let Some(token) = token {
                if codec.verify(token).is_ok() {
                    return GateOutcome::Redirect(config.home_path().to_string());
                }
            }
            GateOutcome::Pass
        }
        RouteClass::Public => GateOutcome::Pass,
        RouteClass::ProtectedPage | RouteClass::ProtectedApi => match token {
            None => reject(config, path, query),
            Some(token) => match codec.verify(token) {
                Ok(_) => GateOutcome::Pass,
                Err(err) => {
                    debug!("Session token rejected for {}: {}", path, err);
                    reject(config, path, query)
                }
            },
        },
    }
}

/// Terminal rejection: 401 for API-shaped paths, otherwise a login redirect
/// carrying the original path+query in `from`.
///
/// The redirect stays under the configured base path so the browser never
/// leaves the mounted prefix.
fn reject(config: &Config, path: &str, query: Option<&str>) -> GateOutcome {
    if routes::is_api_path(path) {
        return GateOutcome::Unauthorized;
    }

    let original = match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    };
    let from = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("from", &original)
        .finish();
    GateOutcome::Redirect(format!("{}/login?{from}", config.base_path))
}

/// Middleware that gates every request on the session cookie.
///
/// Applied outside route matching so it also covers paths no route claims.
pub async fn auth_gateway_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let token = cookie::token_from_headers(request.headers(), &state.config.auth.session.cookie_name).map(str::to_string);

    match evaluate(&state.codec, &state.config, &path, query.as_deref(), token.as_deref()) {
        GateOutcome::Pass => next.run(request).await,
        GateOutcome::Redirect(location) => redirect_response(&location),
        GateOutcome::Unauthorized => unauthorized_response(),
    }
}

fn redirect_response(location: &str) -> Response {
    // Paths come out of a parsed URI, so this only fails for exotic inputs
    let Ok(value) = HeaderValue::from_str(location) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(header::LOCATION, value);
    response
}

fn unauthorized_response() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, Json(json!({ "ok": false, "error": "Unauthorized" }))).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Application, test_utils::create_test_config};
    use axum::{Router, routing::get};

    fn codec_and_config() -> (TokenCodec, Config) {
        let config = create_test_config();
        let codec = TokenCodec::from_config(&config).unwrap();
        (codec, config)
    }

    #[test]
    fn test_protected_page_without_token_redirects_with_from() {
        let (codec, config) = codec_and_config();

        let outcome = evaluate(&codec, &config, "/advanced", None, None);
        assert_eq!(outcome, GateOutcome::Redirect("/login?from=%2Fadvanced".to_string()));
    }

    #[test]
    fn test_redirect_carries_query_string() {
        let (codec, config) = codec_and_config();

        let outcome = evaluate(&codec, &config, "/advanced", Some("tab=flags"), None);
        assert_eq!(outcome, GateOutcome::Redirect("/login?from=%2Fadvanced%3Ftab%3Dflags".to_string()));
    }

    #[test]
    fn test_protected_api_without_token_is_unauthorized() {
        let (codec, config) = codec_and_config();

        assert_eq!(evaluate(&codec, &config, "/api/read-file", None, None), GateOutcome::Unauthorized);
        assert_eq!(evaluate(&codec, &config, "/api/write-to-file", None, None), GateOutcome::Unauthorized);
    }

    #[test]
    fn test_public_paths_pass_without_token() {
        let (codec, config) = codec_and_config();

        assert_eq!(evaluate(&codec, &config, "/readme", None, None), GateOutcome::Pass);
        assert_eq!(evaluate(&codec, &config, "/assets/app.js", None, None), GateOutcome::Pass);
        assert_eq!(evaluate(&codec, &config, "/api/session", None, None), GateOutcome::Pass);
    }

    #[test]
    fn test_login_page_with_valid_token_redirects_home() {
        let (codec, config) = codec_and_config();
        let token = codec.issue("admin", "admin").unwrap();

        let outcome = evaluate(&codec, &config, "/login", None, Some(&token));
        assert_eq!(outcome, GateOutcome::Redirect("/".to_string()));
    }

    #[test]
    fn test_login_page_redirect_respects_base_path() {
        let mut config = create_test_config();
        config.base_path = "/feature".to_string();
        let codec = TokenCodec::from_config(&config).unwrap();
        let token = codec.issue("admin", "admin").unwrap();

        let outcome = evaluate(&codec, &config, "/login", None, Some(&token));
        assert_eq!(outcome, GateOutcome::Redirect("/feature".to_string()));
    }

    #[test]
    fn test_login_redirect_stays_under_base_path() {
        let mut config = create_test_config();
        config.base_path = "/feature".to_string();
        let codec = TokenCodec::from_config(&config).unwrap();

        // Both Location headers the gateway can emit share the same frame
        let outcome = evaluate(&codec, &config, "/advanced", None, None);
        assert_eq!(outcome, GateOutcome::Redirect("/feature/login?from=%2Fadvanced".to_string()));

        let token = codec.issue("admin", "admin").unwrap();
        let outcome = evaluate(&codec, &config, "/login", None, Some(&token));
        assert_eq!(outcome, GateOutcome::Redirect("/feature".to_string()));
    }

    #[test]
    fn test_login_page_with_garbage_token_renders_login() {
        let (codec, config) = codec_and_config();

        assert_eq!(evaluate(&codec, &config, "/login", None, Some("not-a-token")), GateOutcome::Pass);
    }

    #[test]
    fn test_valid_token_passes_protected_paths() {
        let (codec, config) = codec_and_config();
        let token = codec.issue("admin", "admin").unwrap();

        assert_eq!(evaluate(&codec, &config, "/", None, Some(&token)), GateOutcome::Pass);
        assert_eq!(evaluate(&codec, &config, "/advanced", None, Some(&token)), GateOutcome::Pass);
        assert_eq!(evaluate(&codec, &config, "/api/read-file", None, Some(&token)), GateOutcome::Pass);
    }

    #[test]
    fn test_invalid_token_rejected_by_path_shape() {
        let (codec, config) = codec_and_config();

        // Same bad token, different failure shape: discriminated by is_api_path
        assert_eq!(evaluate(&codec, &config, "/api/read-file", None, Some("garbage")), GateOutcome::Unauthorized);
        assert_eq!(
            evaluate(&codec, &config, "/advanced", None, Some("garbage")),
            GateOutcome::Redirect("/login?from=%2Fadvanced".to_string())
        );
    }

    fn dashboard() -> Router<crate::AppState> {
        Router::new()
            .route("/", get(|| async { "home" }))
            .route("/advanced", get(|| async { "advanced" }))
            .route("/readme", get(|| async { "readme" }))
            .route("/login", get(|| async { "login form" }))
            .route("/api/read-file", get(|| async { "file contents" }))
    }

    #[tokio::test]
    async fn test_gateway_redirects_page_requests() {
        let app = Application::with_app(create_test_config(), dashboard()).unwrap();
        let server = app.into_test_server();

        let response = server.get("/advanced").await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.headers().get("location").unwrap(), "/login?from=%2Fadvanced");
    }

    #[tokio::test]
    async fn test_gateway_rejects_api_requests_with_401() {
        let app = Application::with_app(create_test_config(), dashboard()).unwrap();
        let server = app.into_test_server();

        let response = server.get("/api/read-file").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("www-authenticate").unwrap(), "Bearer realm=\"feature\"");

        let body: serde_json::Value = response.json();
        assert_eq!(body, json!({ "ok": false, "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_gateway_passes_valid_sessions() {
        let config = create_test_config();
        let codec = TokenCodec::from_config(&config).unwrap();
        let token = codec.issue("admin", "admin").unwrap();

        let app = Application::with_app(config, dashboard()).unwrap();
        let server = app.into_test_server();

        let response = server
            .get("/advanced")
            .add_header("cookie", format!("session_token={token}"))
            .await;
        response.assert_status_ok();
        response.assert_text("advanced");
    }

    #[tokio::test]
    async fn test_gateway_redirects_authenticated_login_visits() {
        let config = create_test_config();
        let codec = TokenCodec::from_config(&config).unwrap();
        let token = codec.issue("admin", "admin").unwrap();

        let app = Application::with_app(config, dashboard()).unwrap();
        let server = app.into_test_server();

        let response = server
            .get("/login")
            .add_header("cookie", format!("session_token={token}"))
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.headers().get("location").unwrap(), "/");
    }

    #[tokio::test]
    async fn test_gateway_leaves_public_paths_alone() {
        let app = Application::with_app(create_test_config(), dashboard()).unwrap();
        let server = app.into_test_server();

        let response = server.get("/readme").await;
        response.assert_status_ok();
        response.assert_text("readme");
    }
}
