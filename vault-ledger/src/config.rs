//! Configuration for the ledger

use crate::types::{Amount, Limits};
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Policy limits
    pub limits: LimitsConfig,

    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Notification configuration
    #[serde(default)]
    pub events: EventsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "vault-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_format: LogFormat::default(),
            limits: LimitsConfig::default(),
            actor: ActorConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

/// Policy limits as configured
///
/// Amounts are written as decimal strings in TOML because TOML integers
/// are limited to i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Ceiling on aggregate funds
    #[serde(with = "amount_string")]
    pub bank_cap: Amount,

    /// Ceiling on a single withdrawal
    #[serde(with = "amount_string")]
    pub withdraw_cap: Amount,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            bank_cap: 10_000_000_000_000_000_000,     // 10^19 units
            withdraw_cap: 1_000_000_000_000_000_000, // 10^18 units
        }
    }
}

impl From<LimitsConfig> for Limits {
    fn from(cfg: LimitsConfig) -> Self {
        Limits::new(cfg.bank_cap, cfg.withdraw_cap)
    }
}

impl From<Limits> for LimitsConfig {
    fn from(limits: Limits) -> Self {
        Self {
            bank_cap: limits.bank_cap,
            withdraw_cap: limits.withdraw_cap,
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Bounded mailbox capacity (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer; slow subscribers lag past this
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(crate::Error::Config(format!("Unknown log format: {}", other))),
        }
    }
}

impl Config {
    /// Configuration with the given limits and defaults elsewhere
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits: limits.into(),
            ..Default::default()
        }
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(cap) = std::env::var("VAULT_BANK_CAP") {
            config.limits.bank_cap = parse_env("VAULT_BANK_CAP", &cap)?;
        }

        if let Ok(cap) = std::env::var("VAULT_WITHDRAW_CAP") {
            config.limits.withdraw_cap = parse_env("VAULT_WITHDRAW_CAP", &cap)?;
        }

        if let Ok(capacity) = std::env::var("VAULT_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = parse_env("VAULT_MAILBOX_CAPACITY", &capacity)?;
        }

        if let Ok(capacity) = std::env::var("VAULT_EVENT_CAPACITY") {
            config.events.channel_capacity = parse_env("VAULT_EVENT_CAPACITY", &capacity)?;
        }

        if let Ok(format) = std::env::var("VAULT_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot honour
    pub fn validate(&self) -> crate::Result<()> {
        // tokio panics on zero-capacity channels
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(crate::Error::Config(
                "events.channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| crate::Error::Config(format!("Invalid {}={:?}: {}", name, value, e)))
}

mod amount_string {
    use crate::types::Amount;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim().replace('_', "").parse().map_err(de::Error::custom)
    }
}
