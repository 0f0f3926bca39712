//! HTTP API surface: the session endpoints and their OpenAPI document.

pub mod handlers;
pub mod models;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::session_status,
    ),
    components(schemas(
        models::auth::LoginRequest,
        models::auth::LoginBody,
        models::auth::LogoutBody,
        models::auth::SessionStatus,
    )),
    tags(
        (name = "session", description = "Session issuance, teardown, and status")
    )
)]
pub struct ApiDoc;
