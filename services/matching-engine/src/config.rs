//! Engine configuration
//!
//! Plain structs with `Default` values, deserializable from a JSON document.

use serde::Deserialize;
use types::errors::ConfigError;

/// Reference mid-price engine settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MidPriceConfig {
    /// Retention window of mid-price samples, in milliseconds
    pub reference_mid_price_period_ms: i64,
    /// Incremental updates allowed before a full recomputation
    pub max_recalculation_count: usize,
}

impl Default for MidPriceConfig {
    fn default() -> Self {
        Self {
            reference_mid_price_period_ms: 30 * 60 * 1000,
            max_recalculation_count: 1000,
        }
    }
}

impl MidPriceConfig {
    /// Reject values the engine cannot operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference_mid_price_period_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "reference_mid_price_period_ms".to_string(),
                reason: format!("must be positive, got {}", self.reference_mid_price_period_ms),
            });
        }
        if self.max_recalculation_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_recalculation_count".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mid_price: MidPriceConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mid_price.validate()
    }
}
