//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `FLAGGATE_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FLAGGATE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `FLAGGATE_AUTH__CREDENTIALS__PASSWORD=hunter2` sets `auth.credentials.password`.
//!
//! ## Required values
//!
//! The signing secret and the dashboard password have no defaults. A missing `secret_key` is a
//! fatal misconfiguration caught by [`Config::validate`] at startup - the server never falls back
//! to a development secret with a breakable signature.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FLAGGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded once at startup and treated as immutable afterwards; every request
/// reads the same configuration, there is no ad-hoc environment access at
/// request time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Base path the dashboard is mounted under when deployed behind a proxy
    /// (e.g. "/feature"). Empty means the dashboard lives at the root.
    ///
    /// Scopes the session cookie, the post-login home redirect, and the
    /// `from` parameter normalization.
    pub base_path: String,
    /// Secret key for signing session tokens (required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_path: String::new(),
            secret_key: None,
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// The single configured credential pair
    pub credentials: CredentialsConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials: CredentialsConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// The configured dashboard credentials.
///
/// This design deliberately has no user directory: one username/password
/// pair, provided by configuration, is the whole credential store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Username of the dashboard principal
    pub username: String,
    /// Password for the dashboard principal (required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Role claim stamped into issued tokens. Carried as an open string so
    /// additional tiers can be introduced without a token format change.
    pub role: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
            role: "admin".to_string(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session lifetime; both the token expiry and the cookie Max-Age
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for the session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// Set HttpOnly on cookies. Defaults to true; disable only if the
    /// dashboard needs to read the cookie from client-side script.
    pub cookie_http_only: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8 * 60 * 60),
            cookie_name: "session_token".to_string(),
            cookie_secure: false,
            cookie_http_only: true,
            cookie_same_site: "lax".to_string(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("FLAGGATE_").split("__"))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                 Set the FLAGGATE_SECRET_KEY environment variable or add secret_key to the config file; \
                 there is no development fallback."
                    .to_string(),
            });
        }

        if self.auth.credentials.password.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Internal {
                operation: "Config validation: auth.credentials.password is not configured. \
                 Set FLAGGATE_AUTH__CREDENTIALS__PASSWORD or add it to the config file."
                    .to_string(),
            });
        }

        if self.auth.credentials.username.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: auth.credentials.username cannot be empty".to_string(),
            });
        }

        // Validate session lifetime is reasonable
        if self.auth.session.timeout.as_secs() < 300 {
            // Less than 5 minutes
            return Err(Error::Internal {
                operation: "Config validation: session timeout is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.session.timeout.as_secs() > 86400 * 30 {
            // More than 30 days
            return Err(Error::Internal {
                operation: "Config validation: session timeout is too long (maximum 30 days)".to_string(),
            });
        }

        if !matches!(self.auth.session.cookie_same_site.as_str(), "strict" | "lax" | "none") {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: cookie_same_site must be one of strict, lax, none (got {:?})",
                    self.auth.session.cookie_same_site
                ),
            });
        }

        if !self.base_path.is_empty() {
            if !self.base_path.starts_with('/') {
                return Err(Error::Internal {
                    operation: format!("Config validation: base_path must start with '/' (got {:?})", self.base_path),
                });
            }
            if self.base_path.ends_with('/') {
                return Err(Error::Internal {
                    operation: format!("Config validation: base_path must not end with '/' (got {:?})", self.base_path),
                });
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Path scope of the session cookie: the base path, or the whole site.
    pub fn cookie_path(&self) -> &str {
        if self.base_path.is_empty() { "/" } else { &self.base_path }
    }

    /// Where an already-authenticated visit to the login page is sent.
    pub fn home_path(&self) -> &str {
        if self.base_path.is_empty() { "/" } else { &self.base_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn valid_args() -> Args {
        Args {
            config: "test.yaml".to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_load_from_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: "test-secret-key"
port: 9000
base_path: "/feature"
auth:
  credentials:
    username: operator
    password: hunter2
  session:
    timeout: 2h
    cookie_same_site: strict
"#,
            )?;

            let config = Config::load(&valid_args())?;

            assert_eq!(config.port, 9000);
            assert_eq!(config.base_path, "/feature");
            assert_eq!(config.auth.credentials.username, "operator");
            assert_eq!(config.auth.credentials.role, "admin"); // default
            assert_eq!(config.auth.session.timeout, Duration::from_secs(7200));
            assert_eq!(config.auth.session.cookie_same_site, "strict");
            assert_eq!(config.auth.session.cookie_name, "session_token"); // default
            assert!(config.auth.session.cookie_http_only); // default

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: "test-secret-key"
auth:
  credentials:
    password: from-yaml
"#,
            )?;

            jail.set_env("FLAGGATE_HOST", "127.0.0.1");
            jail.set_env("FLAGGATE_PORT", "8081");
            jail.set_env("FLAGGATE_AUTH__CREDENTIALS__PASSWORD", "from-env");

            let config = Config::load(&valid_args())?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8081);
            assert_eq!(config.auth.credentials.password.as_deref(), Some("from-env"));

            Ok(())
        });
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let mut config = Config::default();
        config.auth.credentials.password = Some("hunter2".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("secret_key is not configured"));
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let mut config = Config::default();
        config.secret_key = Some(String::new());
        config.auth.credentials.password = Some("hunter2".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_password_is_fatal() {
        let mut config = Config::default();
        config.secret_key = Some("test-secret-key".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("password is not configured"));
    }

    #[test]
    fn test_session_timeout_bounds() {
        let mut config = Config::default();
        config.secret_key = Some("test-secret-key".to_string());
        config.auth.credentials.password = Some("hunter2".to_string());

        config.auth.session.timeout = Duration::from_secs(60);
        assert!(config.validate().is_err());

        config.auth.session.timeout = Duration::from_secs(86400 * 31);
        assert!(config.validate().is_err());

        config.auth.session.timeout = Duration::from_secs(8 * 60 * 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_path_shape() {
        let mut config = Config::default();
        config.secret_key = Some("test-secret-key".to_string());
        config.auth.credentials.password = Some("hunter2".to_string());

        config.base_path = "feature".to_string();
        assert!(config.validate().is_err());

        config.base_path = "/feature/".to_string();
        assert!(config.validate().is_err());

        config.base_path = "/feature".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.cookie_path(), "/feature");
        assert_eq!(config.home_path(), "/feature");

        config.base_path = String::new();
        assert_eq!(config.cookie_path(), "/");
        assert_eq!(config.home_path(), "/");
    }

    #[test]
    fn test_invalid_same_site_rejected() {
        let mut config = Config::default();
        config.secret_key = Some("test-secret-key".to_string());
        config.auth.credentials.password = Some("hunter2".to_string());
        config.auth.session.cookie_same_site = "Lax".to_string();

        assert!(config.validate().is_err());
    }
}
