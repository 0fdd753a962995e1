use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Most slots a client exposes.
pub const MAX_SLOT_COUNT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub slot_count: usize,
    pub limit_refresh_interval_ms: u64,
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            slot_count: 8,
            limit_refresh_interval_ms: 1_000,
            log_filter: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = LedgerConfig::default();

        let slot_count = match env_map.get("FLIPLEDGER_SLOT_COUNT") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_SLOT_COUNT).contains(n))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "FLIPLEDGER_SLOT_COUNT".to_string(),
                        format!("must be between 1 and {}, got {}", MAX_SLOT_COUNT, raw),
                    )
                })?,
            None => defaults.slot_count,
        };

        let limit_refresh_interval_ms = match env_map.get("FLIPLEDGER_LIMIT_REFRESH_MS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "FLIPLEDGER_LIMIT_REFRESH_MS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?,
            None => defaults.limit_refresh_interval_ms,
        };

        let log_filter = env_map
            .get("FLIPLEDGER_LOG")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.log_filter);

        Ok(LedgerConfig {
            slot_count,
            limit_refresh_interval_ms,
            log_filter,
        })
    }

    pub fn limit_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.limit_refresh_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LedgerConfig::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.slot_count, 8);
        assert_eq!(config.limit_refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_config_reads_overrides() {
        let mut env_map = HashMap::new();
        env_map.insert("FLIPLEDGER_SLOT_COUNT".to_string(), "3".to_string());
        env_map.insert("FLIPLEDGER_LIMIT_REFRESH_MS".to_string(), "250".to_string());
        env_map.insert("FLIPLEDGER_LOG".to_string(), "flipledger=debug".to_string());

        let config = LedgerConfig::from_env_map(env_map).unwrap();
        assert_eq!(config.slot_count, 3);
        assert_eq!(config.limit_refresh_interval_ms, 250);
        assert_eq!(config.log_filter, "flipledger=debug");
    }

    #[test]
    fn test_slot_count_out_of_range() {
        for raw in ["0", "17", "eight"] {
            let mut env_map = HashMap::new();
            env_map.insert("FLIPLEDGER_SLOT_COUNT".to_string(), raw.to_string());
            let err = LedgerConfig::from_env_map(env_map).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue(ref key, _) if key == "FLIPLEDGER_SLOT_COUNT"
            ));
        }
    }

    #[test]
    fn test_refresh_interval_must_be_positive() {
        let mut env_map = HashMap::new();
        env_map.insert("FLIPLEDGER_LIMIT_REFRESH_MS".to_string(), "0".to_string());
        assert!(LedgerConfig::from_env_map(env_map).is_err());
    }

    #[test]
    fn test_blank_log_filter_falls_back() {
        let mut env_map = HashMap::new();
        env_map.insert("FLIPLEDGER_LOG".to_string(), "  ".to_string());
        let config = LedgerConfig::from_env_map(env_map).unwrap();
        assert_eq!(config.log_filter, "info");
    }
}
