//! Back-office API configuration module.
//!
//! Configuration is loaded once at start-up from `PDV_*` environment
//! variables, with fallback to defaults, and handed to the rest of the app
//! through [`AppState`](crate::AppState).

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use pdv_core::validation::validate_till_id;
use pdv_core::{DiscrepancyPolicy, Severity, DEFAULT_TILL_ID};

/// Secret used when `PDV_JWT_SECRET` is unset. Development only.
pub const DEV_JWT_SECRET: &str = "pdv-backoffice-dev-secret-change-in-production";

/// Back-office API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub bind_addr: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Till this instance serves when a request names none
    pub till_id: String,

    /// HS256 secret for signing and verifying access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// Severity labels attached to discrepancy classifications
    pub discrepancy_policy: DiscrepancyPolicy,

    /// First operator, created when the operators table is empty
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `load` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str, default: &str| -> String {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let severity = |key: &str, default: Severity| -> Result<Severity, ConfigError> {
            match get(key) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string())),
                None => Ok(default),
            }
        };

        let defaults = DiscrepancyPolicy::default();

        let config = ApiConfig {
            bind_addr: value("PDV_BIND_ADDR", "0.0.0.0")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PDV_BIND_ADDR".to_string()))?,

            port: value("PDV_PORT", "8080")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PDV_PORT".to_string()))?,

            database_path: PathBuf::from(value("PDV_DATABASE_PATH", "./pdv.db")),

            till_id: value("PDV_TILL_ID", DEFAULT_TILL_ID),

            jwt_secret: value("PDV_JWT_SECRET", DEV_JWT_SECRET),

            jwt_access_lifetime_secs: value("PDV_JWT_ACCESS_LIFETIME_SECS", "28800") // 8 hours, one shift
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PDV_JWT_ACCESS_LIFETIME_SECS".to_string()))?,

            discrepancy_policy: DiscrepancyPolicy {
                deficit: severity("PDV_DEFICIT_SEVERITY", defaults.deficit)?,
                exact: defaults.exact,
                surplus: severity("PDV_SURPLUS_SEVERITY", defaults.surplus)?,
            },

            admin_username: get("PDV_ADMIN_USERNAME").filter(|v| !v.trim().is_empty()),
            admin_password: get("PDV_ADMIN_PASSWORD").filter(|v| !v.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_till_id(&self.till_id)
            .map_err(|_| ConfigError::InvalidValue("PDV_TILL_ID".to_string()))?;

        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "PDV_JWT_ACCESS_LIFETIME_SECS".to_string(),
            ));
        }

        match (&self.admin_username, &self.admin_password) {
            (Some(_), None) => Err(ConfigError::MissingRequired(
                "PDV_ADMIN_PASSWORD".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingRequired(
                "PDV_ADMIN_USERNAME".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Configuration for in-process tests: in-memory database, loopback bind.
    pub fn for_tests(jwt_secret: &str) -> Self {
        ApiConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            database_path: PathBuf::from(":memory:"),
            till_id: DEFAULT_TILL_ID.to_string(),
            jwt_secret: jwt_secret.to_string(),
            jwt_access_lifetime_secs: 3600,
            discrepancy_policy: DiscrepancyPolicy::default(),
            admin_username: None,
            admin_password: None,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
