use burrow_core::DedupScope;
use burrow_telemetry::LogFormat;
use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "BURROW_GATEWAY_LISTEN_ADDR";
pub const REDIRECT_BASE_URL_ENV: &str = "BURROW_GATEWAY_REDIRECT_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "BURROW_GATEWAY_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "BURROW_GATEWAY_MYSQL_DSN";
pub const GENERATOR_ENV: &str = "BURROW_GATEWAY_GENERATOR";
pub const CODE_LENGTH_ENV: &str = "BURROW_GATEWAY_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "BURROW_GATEWAY_MAX_ATTEMPTS";
pub const DEDUP_ENV: &str = "BURROW_GATEWAY_DEDUP";
pub const CACHE_BACKEND_ENV: &str = "BURROW_GATEWAY_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "BURROW_GATEWAY_REDIS_URL";
pub const CACHE_CAPACITY_ENV: &str = "BURROW_GATEWAY_CACHE_CAPACITY";
pub const CACHE_TTL_SECS_ENV: &str = "BURROW_GATEWAY_CACHE_TTL_SECS";
pub const NEGATIVE_CACHE_TTL_SECS_ENV: &str = "BURROW_GATEWAY_NEGATIVE_CACHE_TTL_SECS";
pub const STORE_TIMEOUT_MS_ENV: &str = "BURROW_GATEWAY_STORE_TIMEOUT_MS";
pub const CACHE_TIMEOUT_MS_ENV: &str = "BURROW_GATEWAY_CACHE_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "BURROW_GATEWAY_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_REDIRECT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    Random,
    Sequential,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DedupArg {
    Off,
    Global,
    Owner,
}

impl From<DedupArg> for DedupScope {
    fn from(value: DedupArg) -> Self {
        match value {
            DedupArg::Off => DedupScope::Off,
            DedupArg::Global => DedupScope::Global,
            DedupArg::Owner => DedupScope::PerOwner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "none")]
    Disabled,
    Moka,
    Redis,
    Layered,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Disabled => write!(f, "none"),
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "burrow-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of every returned short URL.
    #[arg(long, env = REDIRECT_BASE_URL_ENV, default_value = DEFAULT_REDIRECT_BASE_URL)]
    pub redirect_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = GENERATOR_ENV, value_enum, default_value_t = GeneratorArg::Random)]
    pub generator: GeneratorArg,

    /// Length of random codes.
    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = 7)]
    pub code_length: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 5)]
    pub max_attempts: u32,

    #[arg(long, env = DEDUP_ENV, value_enum, default_value_t = DedupArg::Off)]
    pub dedup: DedupArg,

    #[arg(long, env = CACHE_BACKEND_ENV, value_enum, default_value_t = CacheBackendArg::Moka)]
    pub cache: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    /// Maximum entries held by the in-process cache.
    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = 10_000)]
    pub cache_capacity: u64,

    #[arg(long, env = CACHE_TTL_SECS_ENV, default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Cache "not found" results for this many seconds; off when unset.
    #[arg(long, env = NEGATIVE_CACHE_TTL_SECS_ENV)]
    pub negative_cache_ttl_secs: Option<u64>,

    #[arg(long, env = STORE_TIMEOUT_MS_ENV, default_value_t = 2_000)]
    pub store_timeout_ms: u64,

    #[arg(long, env = CACHE_TIMEOUT_MS_ENV, default_value_t = 200)]
    pub cache_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}

impl CLI {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn negative_cache_ttl(&self) -> Option<Duration> {
        self.negative_cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}
