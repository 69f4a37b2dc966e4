use clap::{Parser, ValueEnum};
use ephemera_reaper::ReaperConfig;
use ephemera_storage::PoolConfig;
use ephemera_telemetry::{LogFormat, TelemetryConfig};
use std::time::Duration;

pub const DATABASE_URL_ENV: &str = "EPHEMERA_DATABASE_URL";
pub const POOL_MAX_ENV: &str = "EPHEMERA_POOL_MAX_CONNECTIONS";
pub const POOL_TIMEOUT_ENV: &str = "EPHEMERA_POOL_ACQUIRE_TIMEOUT_SECS";
pub const INTERVAL_ENV: &str = "EPHEMERA_REAPER_INTERVAL_SECS";
pub const STATS_EVERY_ENV: &str = "EPHEMERA_REAPER_STATS_EVERY";
pub const LOG_FILTER_ENV: &str = "EPHEMERA_LOG";
pub const LOG_FORMAT_ENV: &str = "EPHEMERA_LOG_FORMAT";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://ephemera.db";

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
#[command(name = "ephemera-reaper", about = "Deletes expired pastes")]
pub struct CLI {
    /// Run a single pass and exit, for use under an external scheduler.
    #[arg(long)]
    pub once: bool,

    #[arg(long, env = INTERVAL_ENV, default_value_t = 60)]
    pub interval_secs: u64,

    #[arg(long, env = STATS_EVERY_ENV, default_value_t = 10)]
    pub stats_every: u64,

    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(long, env = POOL_MAX_ENV, default_value_t = 10)]
    pub pool_max_connections: u32,

    #[arg(long, env = POOL_TIMEOUT_ENV, default_value_t = 5)]
    pub pool_acquire_timeout_secs: u64,

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

    pub fn reaper(&self) -> ReaperConfig {
        ReaperConfig::builder()
            .interval(Duration::from_secs(self.interval_secs.max(1)))
            .stats_every(self.stats_every)
            .build()
    }
}
