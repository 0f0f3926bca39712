use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};

use crate::{
    AppState,
    api::models::auth::{LoginBody, LoginQuery, LoginRequest, LoginResponse, LogoutBody, LogoutResponse, SessionStatus},
    auth::{cookie, routes},
    errors::Error,
};

/// Login with the configured username and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    tag = "session",
    responses(
        (status = 200, description = "Login successful, session cookie set", body = LoginBody),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(request): Json<LoginRequest>,
) -> Result<LoginResponse, Error> {
    // Verify credentials on a blocking thread to avoid blocking async runtime
    let verifier = state.verifier.clone();
    let username = request.username.clone();
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || verifier.verify(&username, &password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn credential verification task: {e}"),
        })?;

    if !is_valid {
        // Generic rejection: no distinction between unknown user and wrong password
        return Err(Error::Unauthenticated {
            message: Some(format!("login rejected for {:?}", request.username)),
        });
    }

    let token = state.codec.issue(&request.username, state.verifier.role())?;
    let cookie = cookie::session_cookie(&token, &state.config);
    let redirect_to = routes::normalize_from(query.from.as_deref().unwrap_or(""), &state.config.base_path);

    Ok(LoginResponse {
        body: LoginBody { ok: true, redirect_to },
        cookie,
    })
}

/// Logout: clear the session cookie
///
/// Never fails, even if no session existed. The token itself is not revoked -
/// only the carrier is discarded.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "session",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        body: LogoutBody { ok: true },
        cookie: cookie::clear_cookie(&state.config),
    }
}

/// Report whether the request carries a valid session
///
/// Side-effect-free and safe to poll; any decoding or expiry failure reports
/// `authenticated: false` without surfacing the reason.
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    responses(
        (status = 200, description = "Session status", body = SessionStatus),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn session_status(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionStatus> {
    let status = cookie::token_from_headers(&headers, &state.config.auth.session.cookie_name)
        .and_then(|token| state.codec.verify(token).ok())
        .map(|claims| SessionStatus {
            authenticated: true,
            subject: Some(claims.sub),
            role: Some(claims.role),
        })
        .unwrap_or_else(SessionStatus::anonymous);

    Json(status)
}
