use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub analysis: AnalysisConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analysis: AnalysisConfig::from_env()?,
        })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which analysis backend the workflow talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisBackend {
    Simulated,
    Remote { endpoint: String },
}

/// Analysis client and upload settings.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub backend: AnalysisBackend,
    pub simulated_latency: Duration,
    /// `None` lets a remote request run to completion.
    pub request_timeout: Option<Duration>,
    pub max_upload_bytes: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: AnalysisBackend::Simulated,
            simulated_latency: Duration::from_millis(2000),
            request_timeout: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AnalysisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match env::var("APP_ANALYSIS_BACKEND")
            .unwrap_or_else(|_| "mock".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "mock" | "simulated" => AnalysisBackend::Simulated,
            "remote" => {
                let endpoint = env::var("APP_ANALYSIS_ENDPOINT")
                    .ok()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .ok_or(ConfigError::MissingEndpoint)?;
                AnalysisBackend::Remote { endpoint }
            }
            other => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        let simulated_latency = match env::var("APP_ANALYSIS_LATENCY_MS") {
            Ok(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("APP_ANALYSIS_LATENCY_MS"))?,
            ),
            Err(_) => defaults.simulated_latency,
        };

        let request_timeout = match env::var("APP_ANALYSIS_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("APP_ANALYSIS_TIMEOUT_SECS"))?;
                if secs == 0 {
                    return Err(ConfigError::ZeroTimeout);
                }
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let max_upload_bytes = match env::var("APP_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("APP_MAX_UPLOAD_BYTES"))?,
            Err(_) => defaults.max_upload_bytes,
        };

        Ok(Self {
            backend,
            simulated_latency,
            request_timeout,
            max_upload_bytes,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBackend(String),
    MissingEndpoint,
    InvalidNumber(&'static str),
    ZeroTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBackend(value) => write!(
                f,
                "APP_ANALYSIS_BACKEND must be 'mock' or 'remote', got '{}'",
                value
            ),
            ConfigError::MissingEndpoint => write!(
                f,
                "APP_ANALYSIS_ENDPOINT is required when APP_ANALYSIS_BACKEND=remote"
            ),
            ConfigError::InvalidNumber(var) => {
                write!(f, "{} must be a non-negative integer", var)
            }
            ConfigError::ZeroTimeout => write!(
                f,
                "APP_ANALYSIS_TIMEOUT_SECS must be at least 1; unset it to disable the timeout"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBackend(_)
            | ConfigError::MissingEndpoint
            | ConfigError::InvalidNumber(_)
            | ConfigError::ZeroTimeout => None,
        }
    }
}
