//! Request and response bodies for the session endpoints.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Credentials submitted to the login endpoint.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Optional query parameters for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// The original path a protected-page redirect captured.
    pub from: Option<String>,
}

/// Success body for login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginBody {
    pub ok: bool,
    /// Normalized path the client should navigate to after login.
    pub redirect_to: String,
}

/// Login response: the success body plus the session cookie.
#[derive(Debug)]
pub struct LoginResponse {
    pub body: LoginBody,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_cookie((StatusCode::OK, Json(self.body)).into_response(), &self.cookie)
    }
}

/// Unconditional success body for logout.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutBody {
    pub ok: bool,
}

/// Logout response: success plus the clearing cookie.
#[derive(Debug)]
pub struct LogoutResponse {
    pub body: LogoutBody,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_cookie((StatusCode::OK, Json(self.body)).into_response(), &self.cookie)
    }
}

/// Session status report.
///
/// `subject` and `role` are present only when authenticated.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SessionStatus {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            subject: None,
            role: None,
        }
    }
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
