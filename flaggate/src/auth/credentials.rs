//! Verification of submitted credentials against the configured pair.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{config::Config, errors::Error};

/// Checks a submitted username/password against the configured credentials.
///
/// The configured password is hashed with Argon2 once at startup and only the
/// hash is kept; submissions are verified against it, so comparison cost does
/// not depend on where the strings differ. The username check is a
/// constant-time byte comparison. Pure check, no side effects.
#[derive(Clone)]
pub struct CredentialVerifier {
    username: String,
    password_hash: String,
    role: String,
}

impl CredentialVerifier {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let credentials = &config.auth.credentials;
        let password = credentials.password.as_deref().ok_or_else(|| Error::Internal {
            operation: "credential setup: auth.credentials.password is required".to_string(),
        })?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal {
                operation: format!("hash configured password: {e}"),
            })?
            .to_string();

        Ok(Self {
            username: credentials.username.clone(),
            password_hash,
            role: credentials.role.clone(),
        })
    }

    /// Check a submitted pair. Both comparisons always run, regardless of
    /// whether the username already failed.
    ///
    /// Note: Argon2 verification is CPU-heavy; call from `spawn_blocking`
    /// on async paths.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let username_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let password_ok = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        };
        username_ok && password_ok
    }

    /// Role claim stamped into tokens issued for this principal.
    pub fn role(&self) -> &str {
        &self.role
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_verifier() -> CredentialVerifier {
        let mut config = Config::default();
        config.secret_key = Some("test-secret-key".to_string());
        config.auth.credentials.username = "operator".to_string();
        config.auth.credentials.password = Some("correct horse battery staple".to_string());
        CredentialVerifier::from_config(&config).unwrap()
    }

    #[test]
    fn test_correct_credentials() {
        let verifier = create_test_verifier();
        assert!(verifier.verify("operator", "correct horse battery staple"));
    }

    #[test]
    fn test_wrong_password() {
        let verifier = create_test_verifier();
        assert!(!verifier.verify("operator", "wrong password"));
    }

    #[test]
    fn test_wrong_username() {
        let verifier = create_test_verifier();
        assert!(!verifier.verify("admin", "correct horse battery staple"));
    }

    #[test]
    fn test_both_wrong() {
        let verifier = create_test_verifier();
        assert!(!verifier.verify("", ""));
    }

    #[test]
    fn test_missing_password_is_an_error() {
        let mut config = Config::default();
        config.secret_key = Some("test-secret-key".to_string());
        config.auth.credentials.password = None;

        assert!(CredentialVerifier::from_config(&config).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"s4me"));
        assert!(!constant_time_eq(b"short", b"longer"));
        assert!(constant_time_eq(b"", b""));
    }
}
