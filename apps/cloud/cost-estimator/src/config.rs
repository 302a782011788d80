use core_config::{env_or_default, server::ServerConfig, ConfigError, FromEnv};
use database::postgres::PostgresConfig;

/// Tunables for the catalog fetcher (component B): base URL for the
/// provider's offer index, per-request timeout, and retry budget.
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    pub aws_pricing_base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

impl FromEnv for FetcherConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let request_timeout_secs = env_or_default("AWS_REQUEST_TIMEOUT", "3600")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "AWS_REQUEST_TIMEOUT".to_string(),
                details: format!("{e}"),
            })?;
        let max_retries = env_or_default("AWS_MAX_RETRIES", "3")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "AWS_MAX_RETRIES".to_string(),
                details: format!("{e}"),
            })?;

        Ok(Self {
            aws_pricing_base_url: env_or_default(
                "AWS_PRICING_BASE_URL",
                "https://pricing.us-east-1.amazonaws.com",
            ),
            request_timeout_secs,
            max_retries,
        })
    }
}

/// Tunables for the ingestion orchestrator (component E).
#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub concurrency: usize,
    pub batch_size: usize,
    /// Body size above which the fetcher streams to a temp file instead of
    /// loading the response in memory (`STREAM_THRESHOLD`, 20 MiB default).
    pub stream_high_water_mark: u64,
}

impl FromEnv for IngestionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let concurrency = env_or_default("INGESTION_CONCURRENCY", "3")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "INGESTION_CONCURRENCY".to_string(),
                details: format!("{e}"),
            })?;
        let batch_size = env_or_default("INGESTION_BATCH_SIZE", "1000")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "INGESTION_BATCH_SIZE".to_string(),
                details: format!("{e}"),
            })?;
        let stream_high_water_mark = env_or_default("STREAM_HIGH_WATER_MARK", &(20 * 1024 * 1024).to_string())
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "STREAM_HIGH_WATER_MARK".to_string(),
                details: format!("{e}"),
            })?;

        Ok(Self {
            concurrency,
            batch_size,
            stream_high_water_mark,
        })
    }
}

/// Body size above which even the product map no longer fits in memory and
/// must spill to a disk-backed key-value store (`SPILL_THRESHOLD`).
pub const SPILL_THRESHOLD: u64 = 1024 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub ingestion: IngestionConfig,
    pub fetcher: FetcherConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut database = PostgresConfig::from_env()?;
        // §5's connection budget caps the orchestrator at N+1 simultaneous
        // connections (default N=3); the teacher's default of 100 is far
        // too generous for this workload.
        if std::env::var("DB_MAX_CONNECTIONS").is_err() {
            database.max_connections = 10;
        }

        Ok(Self {
            environment: env_or_default("APP_ENV", "development"),
            server: ServerConfig::from_env()?,
            database,
            ingestion: IngestionConfig::from_env()?,
            fetcher: FetcherConfig::from_env()?,
        })
    }
}
