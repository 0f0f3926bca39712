//! # flaggate: session auth gateway for the feature-flag dashboard
//!
//! `flaggate` sits in front of a multi-route dashboard and makes one decision
//! per request: pass it through, redirect it to the login page, or reject it
//! with a 401. It issues a signed, stateless session credential at login and
//! re-validates it on every subsequent request - there is no server-side
//! session table, no user directory, and no revocation list.
//!
//! ## Request Flow
//!
//! Every inbound request first passes through the gateway middleware, which
//! classifies the path ([`auth::routes`]), reads the session cookie
//! ([`auth::cookie`]), and verifies the token ([`auth::session`]). Page
//! navigation and API calls fail differently: a protected page redirects to
//! `/login?from=<original path>`, while an API-shaped path gets a structured
//! `401` with a challenge header - chosen by path shape, never by guesswork
//! about the caller.
//!
//! The session endpoints close the loop: `POST /api/login` checks the
//! configured credentials ([`auth::credentials`]) and sets the cookie,
//! `POST /api/logout` clears it, and `GET /api/session` reports identity
//! without side effects so UI code can poll it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use flaggate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = flaggate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     flaggate::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! The dashboard being protected is mounted with [`Application::with_app`];
//! requests the gate passes through are handled by that router (or fall
//! through to a 404 - the gateway never answers for the origin).
//!
//! ## Configuration
//!
//! See the [`config`] module. The signing secret and the dashboard password
//! are required: startup fails without them rather than degrading to a
//! guessable default.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

use crate::auth::{credentials::CredentialVerifier, middleware::auth_gateway_middleware, session::TokenCodec};

/// Shared state for handlers and the gateway middleware.
///
/// Everything here is immutable after startup; any number of concurrent
/// requests read it without locking.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub codec: TokenCodec,
    pub verifier: CredentialVerifier,
}

/// Build the application router: session endpoints, the OpenAPI document,
/// and the caller-provided dashboard routes the gateway protects.
pub fn build_router(state: AppState, app: Router<AppState>) -> Router {
    let session_routes = Router::new()
        .route("/api/login", post(api::handlers::auth::login))
        .route("/api/logout", post(api::handlers::auth::logout))
        .route("/api/session", get(api::handlers::auth::session_status))
        .route("/openapi.json", get(openapi_spec));

    session_routes.merge(app).with_state(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(api::ApiDoc::openapi())
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] (or [`Application::with_app`] to mount
///    dashboard routes) validates the secret and credentials into their
///    prepared forms and assembles the router
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create an application with no dashboard routes mounted.
    ///
    /// Protected paths that match nothing fall through to a 404 after the
    /// gate; useful when the gateway fronts an externally served dashboard.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_app(config, Router::new())
    }

    /// Create an application serving the given dashboard router behind the gate.
    pub fn with_app(config: Config, app: Router<AppState>) -> anyhow::Result<Self> {
        let codec = TokenCodec::from_config(&config)?;
        let verifier = CredentialVerifier::from_config(&config)?;

        let app_state = AppState::builder()
            .config(config.clone())
            .codec(codec)
            .verifier(verifier)
            .build();
        let router = build_router(app_state.clone(), app);

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        use axum::ServiceExt;

        // Apply the gate before path matching, as serve() does
        let middleware = from_fn_with_state(self.app_state, auth_gateway_middleware);
        let service = middleware.layer(self.router).into_make_service();
        axum_test::TestServer::new(service).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        use axum::ServiceExt;

        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Auth gateway listening on http://{}", bind_addr);

        // Apply the gate before path matching so unrouted paths are covered too
        let middleware = from_fn_with_state(self.app_state, auth_gateway_middleware);
        let service = middleware.layer(self.router);

        axum::serve(listener, service.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
