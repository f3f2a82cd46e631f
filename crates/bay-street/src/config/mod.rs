use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::allocation::{AllocationConstraints, Objective};

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
    pub portfolio: PortfolioConfig,
    pub store: StoreConfig,
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

        let portfolio = PortfolioConfig {
            constraints: AllocationConstraints {
                min_bay_score: number_var("BAY_MIN_SCORE", DEFAULT_MIN_BAY_SCORE)?,
                max_volatility: number_var("BAY_MAX_VOLATILITY", DEFAULT_MAX_VOLATILITY)?,
                max_illiquidity: number_var("BAY_MAX_ILLIQUIDITY", DEFAULT_MAX_ILLIQUIDITY)?,
            },
            objective: match env::var("BAY_OBJECTIVE") {
                Ok(raw) => raw
                    .parse::<Objective>()
                    .map_err(|_| ConfigError::InvalidObjective { value: raw })?,
                Err(_) => Objective::Aha,
            },
        };

        let store = StoreConfig {
            path: env::var("BAY_STORE_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portfolio,
            store,
        })
    }
}

const DEFAULT_MIN_BAY_SCORE: f64 = 50.0;
const DEFAULT_MAX_VOLATILITY: f64 = 15.0;
const DEFAULT_MAX_ILLIQUIDITY: f64 = 3.0;

fn number_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Allocation limits and objective used when a request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioConfig {
    pub constraints: AllocationConstraints,
    pub objective: Objective,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            constraints: AllocationConstraints {
                min_bay_score: DEFAULT_MIN_BAY_SCORE,
                max_volatility: DEFAULT_MAX_VOLATILITY,
                max_illiquidity: DEFAULT_MAX_ILLIQUIDITY,
            },
            objective: Objective::Aha,
        }
    }
}

/// Location of the CSV deal store; `None` keeps the universe in memory.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidObjective { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a finite number (found '{value}')")
            }
            ConfigError::InvalidObjective { value } => {
                write!(f, "BAY_OBJECTIVE must be 'aha' or 'bay_score' (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidObjective { .. } => None,
        }
    }
}
