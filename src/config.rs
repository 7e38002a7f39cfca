//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use crate::cache::{CacheConfig, StoreFallback};
use crate::processors::ProcessorEndpoints;
use crate::services::RetryPolicy;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub processors: ProcessorsConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

/// Downstream processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorsConfig {
    pub default_url: String,
    pub fallback_url: String,
    pub request_timeout: u64, // seconds
    pub health_ttl: u64,      // seconds
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            processors: ProcessorsConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.processors.validate()?;
        self.cache.validate()?;
        self.logging.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_var = if env::var("PORT").is_ok() {
            "PORT"
        } else {
            "SERVER_PORT"
        };

        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var(port_var)
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue(port_var.to_string()))?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("PORT cannot be 0".to_string()));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.is_empty() || self.cors_allowed_origins.iter().any(|o| o == "*")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ProcessorsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ProcessorsConfig {
            default_url: env::var("PAYMENT_PROCESSOR_URL_DEFAULT")
                .unwrap_or_else(|_| "http://payment-processor-default:8080".to_string()),
            fallback_url: env::var("PAYMENT_PROCESSOR_URL_FALLBACK")
                .unwrap_or_else(|_| "http://payment-processor-fallback:8080".to_string()),
            request_timeout: env::var("PROCESSOR_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("PROCESSOR_REQUEST_TIMEOUT_SECS".to_string())
                })?,
            health_ttl: env::var("HEALTH_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HEALTH_CACHE_TTL_SECS".to_string()))?,
            max_attempts: env::var("DELIVERY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DELIVERY_MAX_ATTEMPTS".to_string()))?,
            base_backoff_ms: env::var("DELIVERY_BASE_BACKOFF_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DELIVERY_BASE_BACKOFF_MS".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("PAYMENT_PROCESSOR_URL_DEFAULT", &self.default_url),
            ("PAYMENT_PROCESSOR_URL_FALLBACK", &self.fallback_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be a valid URL",
                    name
                )));
            }
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "PROCESSOR_REQUEST_TIMEOUT_SECS".to_string(),
            ));
        }

        if self.health_ttl == 0 {
            return Err(ConfigError::InvalidValue("HEALTH_CACHE_TTL_SECS".to_string()));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("DELIVERY_MAX_ATTEMPTS".to_string()));
        }

        Ok(())
    }

    pub fn endpoints(&self) -> ProcessorEndpoints {
        ProcessorEndpoints::new(self.default_url.clone(), self.fallback_url.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn health_ttl(&self) -> Duration {
        Duration::from_secs(self.health_ttl)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_backoff_ms),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = CacheConfig::default();

        let redis_url = env::var("REDIS_ADDR")
            .or_else(|_| env::var("REDIS_URL"))
            .map(|raw| normalize_redis_url(&raw))
            .unwrap_or(defaults.redis_url);

        Ok(CacheConfig {
            redis_url,
            max_connections: env::var("REDIS_MAX_CONNECTIONS")
                .unwrap_or_else(|_| defaults.max_connections.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REDIS_MAX_CONNECTIONS".to_string()))?,
            fallback: env::var("SUMMARY_STORE_FALLBACK")
                .unwrap_or_else(|_| "noop".to_string())
                .parse::<StoreFallback>()
                .map_err(ConfigError::InvalidValue)?,
            ..defaults
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.is_empty() {
            return Err(ConfigError::InvalidValue("REDIS_URL".to_string()));
        }

        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err(ConfigError::InvalidValue(
                "REDIS_URL must start with redis:// or rediss://".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("REDIS_MAX_CONNECTIONS".to_string()));
        }

        if self.min_idle > self.max_connections {
            return Err(ConfigError::ValidationFailed(
                "minimum idle connections exceed REDIS_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}

/// `host:port` becomes `redis://host:port`; URLs with a scheme pass through.
pub fn normalize_redis_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("redis://{}", raw)
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: LogFormat::Plain,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
