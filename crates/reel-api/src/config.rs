//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
    /// How long finished jobs stay queryable
    pub job_retention: Duration,
    /// How often the reaper runs
    pub job_reap_interval: Duration,
    /// Keep-alive period on idle progress streams
    pub stream_keepalive: Duration,
    /// Delay before a stream closes after the terminal event
    pub stream_close_grace: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 25 * 1024 * 1024, // inline images
            environment: "development".to_string(),
            metrics_enabled: true,
            job_retention: Duration::from_secs(3600),
            job_reap_interval: Duration::from_secs(60),
            stream_keepalive: Duration::from_secs(15),
            stream_close_grace: Duration::from_millis(1000),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            job_retention: env_parse("JOB_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_retention),
            job_reap_interval: env_parse("JOB_REAP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_reap_interval),
            stream_keepalive: env_parse("STREAM_KEEPALIVE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stream_keepalive),
            stream_close_grace: env_parse("STREAM_CLOSE_GRACE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.stream_close_grace),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
