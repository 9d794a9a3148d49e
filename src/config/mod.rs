use config::{ConfigError, Environment, Map};
use serde::Deserialize;
use std::time::Duration;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

// Настройки жизненного цикла брони
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// How long a PENDING booking holds its seats.
    pub hold: Duration,
    /// Period of the expiry sweeper.
    pub sweep_interval: Duration,
}

/// Flat view of the environment, one field per variable.
#[derive(Debug, Deserialize)]
struct Settings {
    host: String,
    port: u16,
    environment: String,
    rust_log: String,
    log_format: LogFormat,
    database_url: String,
    db_pool_size: u32,
    db_acquire_timeout_secs: u64,
    run_migrations: bool,
    booking_hold_secs: u64,
    expiry_sweep_interval_secs: u64,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default().try_parsing(true))
    }

    /// Reads configuration from an explicit set of variables instead of the environment.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::default().try_parsing(true).source(Some(vars)))
    }

    fn load(source: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 4000)?
            .set_default("environment", "development")?
            .set_default("rust_log", "seat_reservation=debug,tower_http=debug")?
            .set_default("log_format", "pretty")?
            .set_default("db_pool_size", 20)?
            .set_default("db_acquire_timeout_secs", 5)?
            .set_default("run_migrations", true)?
            .set_default("booking_hold_secs", 120)?
            .set_default("expiry_sweep_interval_secs", 30)?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        settings.try_into()
    }
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(s: Settings) -> Result<Self, Self::Error> {
        if s.database_url.trim().is_empty() {
            return Err(ConfigError::Message("DATABASE_URL must be set".into()));
        }
        if s.db_pool_size == 0 {
            return Err(ConfigError::Message("DB_POOL_SIZE must be positive".into()));
        }
        if s.booking_hold_secs == 0 {
            return Err(ConfigError::Message("BOOKING_HOLD_SECS must be positive".into()));
        }
        if s.expiry_sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "EXPIRY_SWEEP_INTERVAL_SECS must be positive".into(),
            ));
        }

        Ok(Config {
            app: AppConfig {
                host: s.host,
                port: s.port,
                environment: s.environment,
                rust_log: s.rust_log,
                log_format: s.log_format,
            },
            database: DatabaseConfig {
                url: s.database_url,
                pool_size: s.db_pool_size,
                acquire_timeout: Duration::from_secs(s.db_acquire_timeout_secs),
                run_migrations: s.run_migrations,
            },
            booking: BookingConfig {
                hold: Duration::from_secs(s.booking_hold_secs),
                sweep_interval: Duration::from_secs(s.expiry_sweep_interval_secs),
            },
        })
    }
}
