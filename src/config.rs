//! Injector configuration.
//!
//! Settings can be built in code or loaded from any [`ConfigSource`], most
//! commonly the process environment.

use std::collections::HashMap;
use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::{DiError, DiResult};

/// Default prefix for environment variables read by [`InjectorConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "FERROUS_INJECTOR";

/// A configuration value that can be various types
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl ConfigValue {
    /// Parses a raw string, preferring integers, then booleans.
    pub fn parse(raw: &str) -> Self {
        if let Ok(int_val) = raw.parse::<i64>() {
            ConfigValue::Integer(int_val)
        } else if let Ok(bool_val) = raw.parse::<bool>() {
            ConfigValue::Boolean(bool_val)
        } else {
            ConfigValue::String(raw.to_string())
        }
    }

    pub fn as_i64(&self) -> DiResult<i64> {
        match self {
            ConfigValue::Integer(i) => Ok(*i),
            other => Err(DiError::Config(format!("{:?} is not an integer", other))),
        }
    }

    pub fn as_bool(&self) -> DiResult<bool> {
        match self {
            ConfigValue::Boolean(b) => Ok(*b),
            ConfigValue::Integer(0) => Ok(false),
            ConfigValue::Integer(1) => Ok(true),
            other => Err(DiError::Config(format!("{:?} is not a boolean", other))),
        }
    }
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Get a configuration value by key
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

/// Environment variable configuration source
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    /// Prefix to filter environment variables
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        let env_key = if let Some(prefix) = &self.prefix {
            format!("{}_{}", prefix.to_uppercase(), key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&env_key).ok().map(|value| ConfigValue::parse(&value))
    }
}

/// In-memory source, handy for tests and embedded defaults.
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }
}

/// Settings shared by every injector of a hierarchy.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::InjectorConfig;
///
/// let config = InjectorConfig::default().with_max_depth(64);
/// assert_eq!(config.max_depth, 64);
/// assert!(config.coalesce_in_flight);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorConfig {
    /// Longest dependency chain a single resolution may build
    pub max_depth: usize,
    /// Concurrent first resolutions of one cache slot share a single factory run
    pub coalesce_in_flight: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            coalesce_in_flight: true,
        }
    }
}

impl InjectorConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_coalesce_in_flight(mut self, coalesce: bool) -> Self {
        self.coalesce_in_flight = coalesce;
        self
    }

    /// Reads `FERROUS_INJECTOR_MAX_DEPTH` and `FERROUS_INJECTOR_COALESCE_IN_FLIGHT`.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        Self::load(&EnvironmentConfigSource::with_prefix(prefix))
    }

    /// Loads settings from `source`; absent keys keep their defaults.
    pub fn load(source: &dyn ConfigSource) -> DiResult<Self> {
        let mut config = Self::default();
        if let Some(value) = source.get("max_depth") {
            let depth = value.as_i64()?;
            if depth <= 0 {
                return Err(DiError::Config(format!("max_depth must be positive, got {}", depth)));
            }
            config.max_depth = depth as usize;
        }
        if let Some(value) = source.get("coalesce_in_flight") {
            config.coalesce_in_flight = value.as_bool()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_config_with_prefix() {
        env::set_var("INJTEST_MAX_DEPTH", "32");
        env::set_var("INJTEST_COALESCE_IN_FLIGHT", "false");

        let config = InjectorConfig::from_env_with_prefix("injtest").unwrap();
        assert_eq!(config.max_depth, 32);
        assert!(!config.coalesce_in_flight);

        env::remove_var("INJTEST_MAX_DEPTH");
        env::remove_var("INJTEST_COALESCE_IN_FLIGHT");
    }

    #[test]
    #[serial]
    fn test_missing_env_keeps_defaults() {
        env::remove_var("FERROUS_INJECTOR_MAX_DEPTH");
        env::remove_var("FERROUS_INJECTOR_COALESCE_IN_FLIGHT");
        assert_eq!(InjectorConfig::from_env().unwrap(), InjectorConfig::default());
    }

    #[test]
    fn test_config_value_conversions() {
        assert_eq!(ConfigValue::parse("42"), ConfigValue::Integer(42));
        assert_eq!(ConfigValue::parse("true"), ConfigValue::Boolean(true));
        assert_eq!(ConfigValue::parse("deep"), ConfigValue::String("deep".into()));
        assert!(ConfigValue::Integer(1).as_bool().unwrap());
        assert!(ConfigValue::String("x".into()).as_i64().is_err());
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let source = MapConfigSource::new().set("max_depth", ConfigValue::Integer(0));
        match InjectorConfig::load(&source) {
            Err(DiError::Config(message)) => assert_eq!(message, "max_depth must be positive, got 0"),
            other => panic!("Expected Config error, got {:?}", other),
        }

        let source = MapConfigSource::new().set("coalesce_in_flight", ConfigValue::String("maybe".into()));
        let err = InjectorConfig::load(&source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: String(\"maybe\") is not a boolean"
        );
    }
}
