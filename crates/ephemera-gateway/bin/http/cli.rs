use clap::{Parser, ValueEnum};
use ephemera_core::{ContentValidator, ExpiryPolicy, ValidationLimits};
use ephemera_ratelimit::RateLimitConfig;
use ephemera_reaper::ReaperConfig;
use ephemera_service::ServiceConfig;
use ephemera_storage::PoolConfig;
use ephemera_telemetry::{LogFormat, TelemetryConfig};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "EPHEMERA_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "EPHEMERA_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "EPHEMERA_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "EPHEMERA_DATABASE_URL";
pub const POOL_MAX_ENV: &str = "EPHEMERA_POOL_MAX_CONNECTIONS";
pub const POOL_TIMEOUT_ENV: &str = "EPHEMERA_POOL_ACQUIRE_TIMEOUT_SECS";
pub const ID_LENGTH_ENV: &str = "EPHEMERA_ID_LENGTH";
pub const DEFAULT_EXPIRY_ENV: &str = "EPHEMERA_DEFAULT_EXPIRY";
pub const MAX_CONTENT_BYTES_ENV: &str = "EPHEMERA_MAX_CONTENT_BYTES";
pub const MAX_ATTEMPTS_ENV: &str = "EPHEMERA_MAX_ID_ATTEMPTS";
pub const CREATE_LIMIT_ENV: &str = "EPHEMERA_CREATE_LIMIT";
pub const VIEW_LIMIT_ENV: &str = "EPHEMERA_VIEW_LIMIT";
pub const RATE_WINDOW_ENV: &str = "EPHEMERA_RATE_WINDOW_SECS";
pub const SWEEP_INTERVAL_ENV: &str = "EPHEMERA_RATE_SWEEP_SECS";
pub const TRUST_FORWARDED_FOR_ENV: &str = "EPHEMERA_TRUST_FORWARDED_FOR";
pub const REAPER_ENABLED_ENV: &str = "EPHEMERA_REAPER_ENABLED";
pub const REAPER_INTERVAL_ENV: &str = "EPHEMERA_REAPER_INTERVAL_SECS";
pub const REAPER_STATS_EVERY_ENV: &str = "EPHEMERA_REAPER_STATS_EVERY";
pub const LOG_FILTER_ENV: &str = "EPHEMERA_LOG";
pub const LOG_FORMAT_ENV: &str = "EPHEMERA_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://ephemera.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ephemera", about = "Expiring paste store")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public origin used to build paste URLs.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(long, env = POOL_MAX_ENV, default_value_t = 10)]
    pub pool_max_connections: u32,

    #[arg(long, env = POOL_TIMEOUT_ENV, default_value_t = 5)]
    pub pool_acquire_timeout_secs: u64,

    #[arg(long, env = ID_LENGTH_ENV, default_value_t = ephemera_core::DEFAULT_ID_LENGTH)]
    pub id_length: usize,

    #[arg(long, env = DEFAULT_EXPIRY_ENV, default_value = ephemera_core::DEFAULT_EXPIRY_KEY)]
    pub default_expiry: String,

    #[arg(
        long,
        env = MAX_CONTENT_BYTES_ENV,
        default_value_t = ephemera_core::validation::DEFAULT_MAX_CONTENT_BYTES
    )]
    pub max_content_bytes: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = ephemera_service::DEFAULT_MAX_ATTEMPTS)]
    pub max_id_attempts: usize,

    #[arg(long, env = CREATE_LIMIT_ENV, default_value_t = 10)]
    pub create_limit: usize,

    #[arg(long, env = VIEW_LIMIT_ENV, default_value_t = 100)]
    pub view_limit: usize,

    #[arg(long, env = RATE_WINDOW_ENV, default_value_t = 60)]
    pub rate_window_secs: u64,

    #[arg(long, env = SWEEP_INTERVAL_ENV, default_value_t = 300)]
    pub rate_sweep_secs: u64,

    /// Key rate limits by the first `X-Forwarded-For` entry. Disable unless
    /// a proxy in front of this process overwrites the header.
    #[arg(
        long,
        env = TRUST_FORWARDED_FOR_ENV,
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub trust_forwarded_for: bool,

    /// Run the expired-paste reaper inside this process.
    #[arg(
        long,
        env = REAPER_ENABLED_ENV,
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub reaper: bool,

    #[arg(long, env = REAPER_INTERVAL_ENV, default_value_t = 60)]
    pub reaper_interval_secs: u64,

    #[arg(long, env = REAPER_STATS_EVERY_ENV, default_value_t = 10)]
    pub reaper_stats_every: u64,

    #[arg(long, env = LOG_FILTER_ENV, default_value = "info")]
    pub log: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

impl CLI {
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .directive(self.log.clone())
            .format(self.log_format.into())
            .build()
    }

    pub fn pool(&self) -> PoolConfig {
        PoolConfig::builder()
            .database_url(self.database_url.clone())
            .max_connections(self.pool_max_connections)
            .acquire_timeout(Duration::from_secs(self.pool_acquire_timeout_secs))
            .build()
    }

    fn expiry(&self) -> Result<ExpiryPolicy, ephemera_core::CoreError> {
        ExpiryPolicy::new(&self.default_expiry)
    }

    pub fn service(&self) -> Result<ServiceConfig, ephemera_core::CoreError> {
        let limits = ValidationLimits::builder()
            .max_bytes(self.max_content_bytes)
            .build();
        Ok(ServiceConfig::builder()
            .validator(ContentValidator::new(limits))
            .expiry(self.expiry()?)
            .max_attempts(self.max_id_attempts)
            .build())
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs.max(1))
    }

    pub fn create_limit(&self) -> RateLimitConfig {
        RateLimitConfig::builder()
            .max_requests(self.create_limit)
            .window(self.window())
            .build()
    }

    pub fn view_limit(&self) -> RateLimitConfig {
        RateLimitConfig::builder()
            .max_requests(self.view_limit)
            .window(self.window())
            .build()
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_sweep_secs.max(1))
    }

    pub fn reaper(&self) -> ReaperConfig {
        ReaperConfig::builder()
            .interval(Duration::from_secs(self.reaper_interval_secs.max(1)))
            .stats_every(self.reaper_stats_every)
            .build()
    }

    pub fn body_limit(&self) -> usize {
        ephemera_gateway::state::body_limit_for(self.max_content_bytes)
    }
}
