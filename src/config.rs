use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Tunables of the balance-consistency engine.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    /// Fraction of a wager credited as commission, applied at creation time.
    pub commission_rate: Decimal,
    /// Attempts per balance-changing transaction before a serialization
    /// conflict is surfaced to the caller.
    pub max_transaction_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            commission_rate: Decimal::new(10, 2),
            max_transaction_attempts: 3,
            retry_backoff_ms: 10,
        }
    }
}

impl LedgerSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
