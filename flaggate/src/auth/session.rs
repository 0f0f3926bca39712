//! Session token issuance and verification.
//!
//! Tokens are self-contained: subject, role, issuance and expiry timestamps,
//! signed with HMAC-SHA256 over the canonical JWT serialization. Validity is
//! recomputed from the token itself on every request - there is no server-side
//! session table and no revocation list. Logout clears the cookie carrier, not
//! the token, so a captured token stays valid until it expires.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{config::Config, errors::Error};

/// Claims carried inside a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,  // Subject (the authenticated principal)
    pub role: String, // Authorization tier
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration time
}

/// Why a presented token failed verification.
///
/// Kept distinct for logging; collapsed to a single "Unauthorized" at the
/// HTTP boundary so clients cannot probe why a token was rejected.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("session token is malformed")]
    Malformed,
    #[error("session token signature is invalid")]
    InvalidSignature,
    #[error("session token has expired")]
    Expired,
}

/// Issues and verifies signed session tokens.
///
/// Built once at startup from the configured signing secret and injected
/// wherever tokens are handled; nothing reads the environment at call time.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    timeout: std::time::Duration,
}

impl TokenCodec {
    /// Create a codec from the configured secret.
    ///
    /// The secret is required; [`Config::validate`] rejects a configuration
    /// without one before this is ever reached.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
            operation: "session tokens: secret_key is required".to_string(),
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Strictly before exp, no grace period
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            validation,
            timeout: config.auth.session.timeout,
        })
    }

    /// Issue a token for the given subject, expiring `session.timeout` from now.
    pub fn issue(&self, subject: &str, role: &str) -> Result<String, Error> {
        let now = Utc::now();
        let exp = now + self.timeout;

        let claims = SessionClaims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| Error::Internal {
            operation: format!("create session token: {e}"),
        })
    }

    /// Verify a token and return its claims.
    ///
    /// The signature comparison inside `jsonwebtoken` is constant-time.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            // Anything else means the token never decoded to valid claims
            _ => TokenError::Malformed,
        })?;

        // decode() only rejects exp < now; a token is already invalid at the
        // expiry instant itself
        if Utc::now().timestamp() >= token_data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}
