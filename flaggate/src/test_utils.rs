//! Shared fixtures for tests.

use crate::config::Config;

/// A valid configuration with test credentials.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-for-sessions".to_string());
    config.auth.credentials.username = "admin".to_string();
    config.auth.credentials.password = Some("hunter2".to_string());
    config
}
