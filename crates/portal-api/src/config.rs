//! Portal API configuration.
//!
//! Configuration is loaded from environment variables. All sensitive
//! fields are redacted in Debug output.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default issuer prefix for certificate-signed ID tokens.
pub const DEFAULT_ISSUER_BASE_URL: &str = "https://securetoken.google.com/";

/// Default metadata URL publishing `{kid: pem_certificate}`.
pub const DEFAULT_CERTS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// Default audience for shared-secret tokens.
pub const DEFAULT_SHARED_SECRET_AUDIENCE: &str = "authenticated";

/// Default timeout for a single signing certificate fetch.
pub const DEFAULT_KEY_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the signing certificate fetch timeout.
pub const MAX_KEY_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Default connection drain period after a shutdown signal.
pub const DEFAULT_SHUTDOWN_DRAIN_SECONDS: u64 = 10;

/// Upper bound for the connection drain period.
pub const MAX_SHUTDOWN_DRAIN_SECONDS: u64 = 300;

/// How bearer tokens are verified. Chosen once at startup.
#[derive(Clone)]
pub enum AuthMode {
    /// RS256 tokens verified against X.509 certificates published at `certs_url`.
    Certificates { certs_url: String },

    /// HS256 tokens verified with a symmetric secret.
    SharedSecret { secret: SecretString },
}

impl AuthMode {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            AuthMode::Certificates { .. } => "certificates",
            AuthMode::SharedSecret { .. } => "shared_secret",
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Certificates { certs_url } => f
                .debug_struct("Certificates")
                .field("certs_url", certs_url)
                .finish(),
            AuthMode::SharedSecret { .. } => f
                .debug_struct("SharedSecret")
                .field("secret", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,

    /// Exact `iss` value accepted.
    pub issuer: String,

    /// Exact `aud` value accepted.
    pub audience: String,

    /// Timeout for one certificate fetch.
    pub key_fetch_timeout: Duration,

    /// Leeway applied to `exp`.
    pub clock_skew_seconds: u64,
}

/// Portal API configuration.
///
/// Database URL is redacted in Debug output to prevent credential leakage.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Seconds to keep draining connections after SIGTERM/SIGINT. Zero skips the drain.
    pub shutdown_drain_seconds: u64,

    pub auth: AuthConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("shutdown_drain_seconds", &self.shutdown_drain_seconds)
            .field("auth", &self.auth)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid auth mode: {0}")]
    InvalidAuthMode(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid key fetch timeout configuration: {0}")]
    InvalidKeyFetchTimeout(String),

    #[error("Invalid shutdown drain configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let shutdown_drain_seconds = if let Some(value_str) = vars.get("PORTAL_DRAIN_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "PORTAL_DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_SHUTDOWN_DRAIN_SECONDS {
                return Err(ConfigError::InvalidDrainSeconds(format!(
                    "PORTAL_DRAIN_SECONDS must not exceed {} seconds, got {}",
                    MAX_SHUTDOWN_DRAIN_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_SHUTDOWN_DRAIN_SECONDS
        };

        let auth = AuthConfig::from_vars(vars)?;

        Ok(Config {
            database_url,
            bind_address,
            shutdown_drain_seconds,
            auth,
        })
    }
}

impl AuthConfig {
    /// Load the token verification settings.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mode_name = vars
            .get("AUTH_MODE")
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "certificates".to_string());

        let (mode, issuer, audience) = match mode_name.as_str() {
            "certificates" => {
                let project_id = required(vars, "AUTH_PROJECT_ID")?;
                let issuer_base = vars
                    .get("AUTH_ISSUER_BASE_URL")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_ISSUER_BASE_URL.to_string());
                let certs_url = vars
                    .get("AUTH_CERTS_URL")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_CERTS_URL.to_string());

                (
                    AuthMode::Certificates { certs_url },
                    format!("{issuer_base}{project_id}"),
                    project_id,
                )
            }
            "shared_secret" => {
                let issuer = required(vars, "AUTH_ISSUER")?;
                let secret = SecretString::from(required(vars, "AUTH_SHARED_SECRET")?);
                let audience = vars
                    .get("AUTH_AUDIENCE")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_SHARED_SECRET_AUDIENCE.to_string());

                (AuthMode::SharedSecret { secret }, issuer, audience)
            }
            other => {
                return Err(ConfigError::InvalidAuthMode(format!(
                    "AUTH_MODE must be 'certificates' or 'shared_secret', got '{}'",
                    other
                )));
            }
        };

        // Parse JWT clock skew tolerance with validation
        let clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            let value = value.unsigned_abs();
            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        let key_fetch_timeout_seconds =
            if let Some(value_str) = vars.get("AUTH_KEY_FETCH_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidKeyFetchTimeout(format!(
                        "AUTH_KEY_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_KEY_FETCH_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidKeyFetchTimeout(format!(
                        "AUTH_KEY_FETCH_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                        MAX_KEY_FETCH_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_KEY_FETCH_TIMEOUT_SECONDS
            };

        Ok(AuthConfig {
            mode,
            issuer,
            audience,
            key_fetch_timeout: Duration::from_secs(key_fetch_timeout_seconds),
            clock_skew_seconds,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://localhost/portal_test".to_string(),
            ),
            ("AUTH_PROJECT_ID".to_string(), "ynym-portal".to_string()),
        ])
    }

    fn shared_secret_vars() -> HashMap<String, String> {
        let mut vars = base_vars();
        vars.remove("AUTH_PROJECT_ID");
        vars.insert("AUTH_MODE".to_string(), "shared_secret".to_string());
        vars.insert(
            "AUTH_ISSUER".to_string(),
            "https://abc.supabase.co/auth/v1".to_string(),
        );
        vars.insert(
            "AUTH_SHARED_SECRET".to_string(),
            "super-secret-hs256-key".to_string(),
        );
        vars
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.database_url, "postgresql://localhost/portal_test");
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.shutdown_drain_seconds, DEFAULT_SHUTDOWN_DRAIN_SECONDS);
        assert_eq!(
            config.auth.issuer,
            "https://securetoken.google.com/ynym-portal"
        );
        assert_eq!(config.auth.audience, "ynym-portal");
        assert_eq!(config.auth.clock_skew_seconds, DEFAULT_CLOCK_SKEW.as_secs());
        assert_eq!(
            config.auth.key_fetch_timeout,
            Duration::from_secs(DEFAULT_KEY_FETCH_TIMEOUT_SECONDS)
        );
        match config.auth.mode {
            AuthMode::Certificates { certs_url } => assert_eq!(certs_url, DEFAULT_CERTS_URL),
            AuthMode::SharedSecret { .. } => panic!("expected certificate mode"),
        }
    }

    #[test]
    fn test_from_vars_custom_issuer_base_and_certs_url() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert(
            "AUTH_ISSUER_BASE_URL".to_string(),
            "https://issuer.test/".to_string(),
        );
        vars.insert(
            "AUTH_CERTS_URL".to_string(),
            "http://127.0.0.1:9999/certs".to_string(),
        );
        vars.insert("AUTH_KEY_FETCH_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "120".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.auth.issuer, "https://issuer.test/ynym-portal");
        assert_eq!(config.auth.key_fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.auth.clock_skew_seconds, 120);
        assert!(
            matches!(config.auth.mode, AuthMode::Certificates { ref certs_url } if certs_url == "http://127.0.0.1:9999/certs")
        );
    }

    #[test]
    fn test_from_vars_shared_secret_mode() {
        let config =
            Config::from_vars(&shared_secret_vars()).expect("Config should load successfully");

        assert_eq!(config.auth.issuer, "https://abc.supabase.co/auth/v1");
        assert_eq!(config.auth.audience, "authenticated");
        match config.auth.mode {
            AuthMode::SharedSecret { secret } => {
                assert_eq!(secret.expose_secret(), "super-secret-hs256-key")
            }
            AuthMode::Certificates { .. } => panic!("expected shared secret mode"),
        }
    }

    #[test]
    fn test_shared_secret_mode_custom_audience() {
        let mut vars = shared_secret_vars();
        vars.insert("AUTH_AUDIENCE".to_string(), "portal".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.auth.audience, "portal");
    }

    #[test]
    fn test_from_vars_missing_database_url() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_certificate_mode_requires_project_id() {
        let mut vars = base_vars();
        vars.remove("AUTH_PROJECT_ID");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_PROJECT_ID"));
    }

    #[test]
    fn test_shared_secret_mode_requires_secret() {
        let mut vars = shared_secret_vars();
        vars.remove("AUTH_SHARED_SECRET");

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_SHARED_SECRET")
        );
    }

    #[test]
    fn test_shared_secret_mode_rejects_blank_issuer() {
        let mut vars = shared_secret_vars();
        vars.insert("AUTH_ISSUER".to_string(), "   ".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_ISSUER"));
    }

    #[test]
    fn test_unknown_auth_mode_rejected() {
        let mut vars = base_vars();
        vars.insert("AUTH_MODE".to_string(), "jwks".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAuthMode(msg)) if msg.contains("'jwks'"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be positive"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert(
            "JWT_CLOCK_SKEW_SECONDS".to_string(),
            "five-minutes".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be a valid integer"))
        );
    }

    #[test]
    fn test_key_fetch_timeout_bounds() {
        for bad in ["0", "61", "ten"] {
            let mut vars = base_vars();
            vars.insert("AUTH_KEY_FETCH_TIMEOUT_SECONDS".to_string(), bad.to_string());
            assert!(
                matches!(
                    Config::from_vars(&vars),
                    Err(ConfigError::InvalidKeyFetchTimeout(_))
                ),
                "timeout '{bad}' should be rejected"
            );
        }

        let mut vars = base_vars();
        vars.insert("AUTH_KEY_FETCH_TIMEOUT_SECONDS".to_string(), "60".to_string());
        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.auth.key_fetch_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_shutdown_drain_seconds() {
        for (raw, expected) in [("0", 0), ("30", 30), ("300", 300)] {
            let mut vars = base_vars();
            vars.insert("PORTAL_DRAIN_SECONDS".to_string(), raw.to_string());
            let config = Config::from_vars(&vars).expect("Config should load successfully");
            assert_eq!(config.shutdown_drain_seconds, expected);
        }

        for bad in ["-1", "301", "soon"] {
            let mut vars = base_vars();
            vars.insert("PORTAL_DRAIN_SECONDS".to_string(), bad.to_string());
            assert!(
                matches!(
                    Config::from_vars(&vars),
                    Err(ConfigError::InvalidDrainSeconds(_))
                ),
                "drain '{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_redacts_database_url_and_secret() {
        let config =
            Config::from_vars(&shared_secret_vars()).expect("Config should load successfully");

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("postgresql://"));
        assert!(!debug_output.contains("portal_test"));
        assert!(!debug_output.contains("super-secret-hs256-key"));
        assert!(debug_output.contains("https://abc.supabase.co/auth/v1"));
    }
}
