//! Application configuration loaded from environment variables.

use std::num::NonZeroUsize;

use thiserror::Error;

use ticketing_core::{CurrencyCode, Locale};
use ticketing_events::BusConfig;
use ticketing_observability::{LogConfig, LogFormat};

pub const ENV_LOG_FILTER: &str = "RUST_LOG";
pub const ENV_LOG_FORMAT: &str = "TICKETING_LOG_FORMAT";
pub const ENV_BUS_CAPACITY: &str = "TICKETING_BUS_CAPACITY";
pub const ENV_LOCALE: &str = "TICKETING_LOCALE";
pub const ENV_DEFAULT_CURRENCY: &str = "TICKETING_DEFAULT_CURRENCY";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Platform configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `TICKETING_LOG_FORMAT` — `json` or `pretty` (default: `json`)
/// - `TICKETING_BUS_CAPACITY` — per-subscription buffer; unset, `0` or
///   `unbounded` means unbounded
/// - `TICKETING_LOCALE` — money display locale (default: `en-US`)
/// - `TICKETING_DEFAULT_CURRENCY` — settlement currency (default: `USD`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub log: LogConfig,
    pub bus: BusConfig,
    pub locale: Locale,
    pub default_currency: CurrencyCode,
}

impl PlatformConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let filter = value(ENV_LOG_FILTER).unwrap_or(defaults.log.filter);
        let format = match value(ENV_LOG_FORMAT) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid(ENV_LOG_FORMAT, e))?,
            None => defaults.log.format,
        };
        let bus = match value(ENV_BUS_CAPACITY) {
            Some(raw) => parse_bus_capacity(&raw)?,
            None => defaults.bus,
        };
        let locale = match value(ENV_LOCALE) {
            Some(raw) => raw
                .parse::<Locale>()
                .map_err(|e| ConfigError::invalid(ENV_LOCALE, e.to_string()))?,
            None => defaults.locale,
        };
        let default_currency = value(ENV_DEFAULT_CURRENCY)
            .map(|raw| CurrencyCode::new(raw.trim()))
            .unwrap_or(defaults.default_currency);

        Ok(Self {
            log: LogConfig { filter, format },
            bus,
            locale,
            default_currency,
        })
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            bus: BusConfig::default(),
            locale: Locale::default(),
            default_currency: CurrencyCode::new("USD"),
        }
    }
}

fn parse_bus_capacity(raw: &str) -> Result<BusConfig, ConfigError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unbounded") {
        return Ok(BusConfig::default());
    }
    let capacity: usize = raw
        .parse()
        .map_err(|_| ConfigError::invalid(ENV_BUS_CAPACITY, format!("not a number: {raw}")))?;
    Ok(match NonZeroUsize::new(capacity) {
        Some(capacity) => BusConfig::bounded(capacity),
        None => BusConfig::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = PlatformConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PlatformConfig::default());
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.bus.subscriber_capacity, None);
        assert_eq!(config.locale, Locale::EnUs);
        assert_eq!(config.default_currency.as_str(), "USD");
    }

    #[test]
    fn test_overrides() {
        let config = PlatformConfig::from_lookup(lookup(&[
            ("RUST_LOG", "debug"),
            ("TICKETING_LOG_FORMAT", "pretty"),
            ("TICKETING_BUS_CAPACITY", "128"),
            ("TICKETING_LOCALE", "de-DE"),
            ("TICKETING_DEFAULT_CURRENCY", "EUR"),
        ]))
        .unwrap();

        assert_eq!(config.log.filter, "debug");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.bus.subscriber_capacity, NonZeroUsize::new(128));
        assert_eq!(config.locale, Locale::DeDe);
        assert_eq!(config.default_currency.as_str(), "EUR");
    }

    #[test]
    fn test_unbounded_capacity_spellings() {
        for raw in ["0", "unbounded", "  "] {
            let config =
                PlatformConfig::from_lookup(lookup(&[("TICKETING_BUS_CAPACITY", raw)])).unwrap();
            assert_eq!(config.bus.subscriber_capacity, None, "input {raw:?}");
        }
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = PlatformConfig::from_lookup(lookup(&[("TICKETING_BUS_CAPACITY", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_BUS_CAPACITY, .. }));

        let err =
            PlatformConfig::from_lookup(lookup(&[("TICKETING_LOCALE", "xx")])).unwrap_err();
        assert!(err.to_string().contains(ENV_LOCALE));

        let err =
            PlatformConfig::from_lookup(lookup(&[("TICKETING_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_LOG_FORMAT, .. }));
    }
}
