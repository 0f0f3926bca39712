//! Authentication and authorization for the gateway.
//!
//! The design is stateless: a signed, self-contained session token is issued
//! at login, carried in a cookie, and re-verified on every request. No
//! server-side session storage, no revocation list - validity is the token's
//! own signature plus expiry.
//!
//! # Modules
//!
//! - [`session`]: session token issuance and verification ([`session::TokenCodec`])
//! - [`credentials`]: checking submitted credentials against the configured pair
//! - [`routes`]: pure path-to-policy classification
//! - [`cookie`]: the cookie carrier binding a token to the browser
//! - [`middleware`]: the per-request gate that ties the above together

pub mod cookie;
pub mod credentials;
pub mod middleware;
pub mod routes;
pub mod session;
