use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;

pub const DEFAULT_INSTITUTION_DOMAIN: &str = "nitrkl.ac.in";
const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_SECS: i64 = 15 * 60;
const DEFAULT_SESSION_TTL_SECS: i64 = 8 * 60 * 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub intake: IntakeConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = LogFormat::from_str(&env::var("APP_LOG_FORMAT").unwrap_or_default());

        let institution_domain = env::var("APP_INSTITUTION_DOMAIN")
            .map(|value| value.trim().trim_start_matches('@').to_ascii_lowercase())
            .unwrap_or_else(|_| DEFAULT_INSTITUTION_DOMAIN.to_string());
        if institution_domain.is_empty() || !institution_domain.contains('.') {
            return Err(ConfigError::InvalidInstitutionDomain(institution_domain));
        }

        let store_path = env::var("APP_STORE_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let credentials = match (env::var("APP_ADMIN_EMAIL"), env::var("APP_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(AdminCredentials {
                    email: email.trim().to_string(),
                    password,
                })
            }
            _ => None,
        };

        let max_failed_attempts = match env::var("APP_ADMIN_MAX_FAILED_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidFailedAttempts)?,
            Err(_) => DEFAULT_MAX_FAILED_ATTEMPTS,
        };
        let lockout = seconds_var("APP_ADMIN_LOCKOUT_SECS", DEFAULT_LOCKOUT_SECS)?;
        let session_ttl = seconds_var("APP_ADMIN_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            intake: IntakeConfig {
                institution_domain,
                store_path,
            },
            admin: AdminConfig {
                credentials,
                max_failed_attempts,
                lockout,
                session_ttl,
            },
        })
    }
}

fn seconds_var(key: &'static str, default: i64) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .map(|value| Duration::seconds(i64::from(value)))
            .ok_or(ConfigError::InvalidDuration(key)),
        Err(_) => Ok(Duration::seconds(default)),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Output shape of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Intake form defaults and where applications are stored.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Domain used for the auto-derived contact e-mail (`<roll>@<domain>`).
    pub institution_domain: String,
    /// JSON document store location; `None` keeps applications in memory.
    pub store_path: Option<PathBuf>,
}

/// Staff console access.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub credentials: Option<AdminCredentials>,
    pub max_failed_attempts: u32,
    /// How long sign-in stays refused after `max_failed_attempts` consecutive failures.
    pub lockout: Duration,
    /// Lifetime of an issued session token.
    pub session_ttl: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout: Duration::seconds(DEFAULT_LOCKOUT_SECS),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidInstitutionDomain(String),
    InvalidFailedAttempts,
    InvalidDuration(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidInstitutionDomain(value) => {
                write!(
                    f,
                    "APP_INSTITUTION_DOMAIN must be a dotted domain name, got '{value}'"
                )
            }
            ConfigError::InvalidFailedAttempts => {
                write!(f, "APP_ADMIN_MAX_FAILED_ATTEMPTS must be a positive integer")
            }
            ConfigError::InvalidDuration(key) => {
                write!(f, "{key} must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidInstitutionDomain(_)
            | ConfigError::InvalidFailedAttempts
            | ConfigError::InvalidDuration(_) => None,
        }
    }
}
