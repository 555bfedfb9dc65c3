use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::cohorts::{
    CapacityConfig, NullScorePolicy, ProgramSettings, Tier, TierCapacity, DEFAULT_RANKING_SIZE,
};

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
    pub program: ProgramSettings,
    /// JSON snapshot loaded into the in-memory store at start.
    pub seed_path: Option<PathBuf>,
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

        let seed_path = env::var("PROGRAM_SEED_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            program: load_program()?,
            seed_path,
        })
    }
}

fn load_program() -> Result<ProgramSettings, ConfigError> {
    let defaults = ProgramSettings::default();
    let mut capacity = defaults.capacity;

    for (tier, total_var, cohort_var) in [
        (
            Tier::Starter,
            "PROGRAM_STARTER_CAPACITY",
            Some("PROGRAM_STARTER_COHORT_CAPACITY"),
        ),
        (
            Tier::Growth,
            "PROGRAM_GROWTH_CAPACITY",
            Some("PROGRAM_GROWTH_COHORT_CAPACITY"),
        ),
        (Tier::Scale, "PROGRAM_SCALE_CAPACITY", None),
    ] {
        let current = capacity.for_tier(tier);
        let total = read_count(total_var, current.total)?;
        let per_cohort = match (cohort_var, current.per_cohort) {
            (Some(var), Some(default)) => Some(read_count(var, default)?),
            _ => current.per_cohort,
        };
        capacity = capacity.with_tier(tier, TierCapacity { total, per_cohort });
    }
    validate_capacity(&capacity)?;

    let ranking_size = read_count("PROGRAM_RANKING_SIZE", DEFAULT_RANKING_SIZE)?;
    let ranking_null_scores = match env::var("PROGRAM_RANKING_NULL_SCORES") {
        Ok(value) => value
            .parse::<NullScorePolicy>()
            .map_err(|_| ConfigError::InvalidNullPolicy { value })?,
        Err(_) => defaults.ranking_null_scores,
    };

    Ok(ProgramSettings {
        capacity,
        ranking_size,
        ranking_null_scores,
    })
}

fn read_count(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidCount { var, value }),
        Err(_) => Ok(default),
    }
}

/// A single cohort can never seat more than its tier. The two ceilings are
/// otherwise checked independently, so cohorts may together exceed the tier.
fn validate_capacity(capacity: &CapacityConfig) -> Result<(), ConfigError> {
    for tier in Tier::ALL {
        let limits = capacity.for_tier(tier);
        if let Some(per_cohort) = limits.per_cohort {
            if per_cohort > limits.total {
                return Err(ConfigError::CohortExceedsTier {
                    tier,
                    per_cohort,
                    total: limits.total,
                });
            }
        }
    }
    Ok(())
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidCount {
        var: &'static str,
        value: String,
    },
    InvalidNullPolicy {
        value: String,
    },
    CohortExceedsTier {
        tier: Tier,
        per_cohort: usize,
        total: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCount { var, value } => {
                write!(f, "{var} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidNullPolicy { value } => write!(
                f,
                "PROGRAM_RANKING_NULL_SCORES must be 'exclude' or 'zero', got '{value}'"
            ),
            ConfigError::CohortExceedsTier {
                tier,
                per_cohort,
                total,
            } => write!(
                f,
                "{tier} cohort capacity {per_cohort} exceeds the tier capacity {total}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCount { .. }
            | ConfigError::InvalidNullPolicy { .. }
            | ConfigError::CohortExceedsTier { .. } => None,
        }
    }
}
