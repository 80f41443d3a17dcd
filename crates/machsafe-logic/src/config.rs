//! Per-machine safety configuration.
//!
//! Machines are configured at load time from JSON prototypes. Every field
//! has a default so partial prototypes are valid:
//!
//! ```json
//! { "critical_temperature": 450.0, "alert_channel": "Science" }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{defaults, OVERHEAT_TEMPERATURE};

/// Errors from parsing or validating a safety configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid safety config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("critical temperature {critical}K must be above the {overheat}K overheat threshold")]
    CriticalBelowOverheat { critical: f32, overheat: f32 },

    #[error("max overheat time must be a positive number of seconds, got {0}")]
    InvalidOverheatTime(f32),

    #[error("alert channel must not be empty")]
    EmptyChannel,

    #[error("prototype '{id}': {source}")]
    Prototype {
        id: String,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Load-time safety limits for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Instant-meltdown temperature (K).
    pub critical_temperature: f32,
    /// Cumulative overheat time tolerated before meltdown (seconds).
    pub max_overheat_seconds: f32,
    /// Radio channel that receives this machine's alerts.
    pub alert_channel: String,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            critical_temperature: defaults::CRITICAL_TEMPERATURE,
            max_overheat_seconds: defaults::MAX_OVERHEAT_SECONDS,
            alert_channel: defaults::ALERT_CHANNEL.to_string(),
        }
    }
}

impl SafetyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_critical_temperature(mut self, kelvin: f32) -> Self {
        self.critical_temperature = kelvin;
        self
    }

    pub fn with_max_overheat_seconds(mut self, seconds: f32) -> Self {
        self.max_overheat_seconds = seconds;
        self
    }

    pub fn with_alert_channel(mut self, channel: impl Into<String>) -> Self {
        self.alert_channel = channel.into();
        self
    }

    /// Overheat budget as a duration. Invalid values collapse to zero.
    pub fn max_overheat(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_overheat_seconds).unwrap_or(Duration::ZERO)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.critical_temperature > OVERHEAT_TEMPERATURE) {
            return Err(ConfigError::CriticalBelowOverheat {
                critical: self.critical_temperature,
                overheat: OVERHEAT_TEMPERATURE,
            });
        }
        if !self.max_overheat_seconds.is_finite() || self.max_overheat_seconds <= 0.0 {
            return Err(ConfigError::InvalidOverheatTime(self.max_overheat_seconds));
        }
        if self.alert_channel.trim().is_empty() {
            return Err(ConfigError::EmptyChannel);
        }
        Ok(())
    }

    /// Copy with every field that fails validation replaced by its default.
    pub fn sanitized(&self) -> Self {
        let fallback = Self::default();
        Self {
            critical_temperature: if self.critical_temperature > OVERHEAT_TEMPERATURE {
                self.critical_temperature
            } else {
                fallback.critical_temperature
            },
            max_overheat_seconds: if self.max_overheat_seconds.is_finite()
                && self.max_overheat_seconds > 0.0
            {
                self.max_overheat_seconds
            } else {
                fallback.max_overheat_seconds
            },
            alert_channel: if self.alert_channel.trim().is_empty() {
                fallback.alert_channel
            } else {
                self.alert_channel.clone()
            },
        }
    }

    /// Parse and validate a single prototype.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SafetyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse a JSON object of prototype id -> config, validating each entry.
pub fn load_prototypes(json: &str) -> Result<BTreeMap<String, SafetyConfig>, ConfigError> {
    let prototypes: BTreeMap<String, SafetyConfig> = serde_json::from_str(json)?;
    for (id, config) in &prototypes {
        config.validate().map_err(|e| ConfigError::Prototype {
            id: id.clone(),
            source: Box::new(e),
        })?;
    }
    Ok(prototypes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_replaces_only_invalid_fields() {
        let bad = SafetyConfig::new()
            .with_critical_temperature(300.0)
            .with_max_overheat_seconds(f32::NAN)
            .with_alert_channel("Science");
        let fixed = bad.sanitized();
        assert!(fixed.validate().is_ok());
        assert_eq!(fixed.critical_temperature, defaults::CRITICAL_TEMPERATURE);
        assert_eq!(fixed.max_overheat_seconds, defaults::MAX_OVERHEAT_SECONDS);
        assert_eq!(fixed.alert_channel, "Science");

        let good = SafetyConfig::new().with_critical_temperature(450.0);
        assert_eq!(good.sanitized(), good);
    }

    #[test]
    fn test_defaults_are_valid() {
        let c = SafetyConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.max_overheat(), Duration::from_secs(600));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c = SafetyConfig::from_json(r#"{ "alert_channel": "Science" }"#).unwrap();
        assert_eq!(c.alert_channel, "Science");
        assert_eq!(c.critical_temperature, 423.0);
        assert_eq!(c.max_overheat_seconds, 600.0);
    }

    #[test]
    fn test_empty_json_is_default() {
        let c = SafetyConfig::from_json("{}").unwrap();
        assert_eq!(c, SafetyConfig::default());
    }

    #[test]
    fn test_critical_must_exceed_overheat() {
        let c = SafetyConfig::new().with_critical_temperature(320.0);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::CriticalBelowOverheat { .. })
        ));
        let nan = SafetyConfig::new().with_critical_temperature(f32::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_overheat_time_must_be_positive() {
        for bad in [0.0, -5.0, f32::INFINITY, f32::NAN] {
            let c = SafetyConfig::new().with_max_overheat_seconds(bad);
            assert!(matches!(
                c.validate(),
                Err(ConfigError::InvalidOverheatTime(_))
            ));
            assert_eq!(c.max_overheat(), Duration::ZERO);
        }
    }

    #[test]
    fn test_blank_channel_rejected() {
        let c = SafetyConfig::new().with_alert_channel("  ");
        assert!(matches!(c.validate(), Err(ConfigError::EmptyChannel)));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            SafetyConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_prototypes() {
        let json = r#"{
            "Thermomachine": { "critical_temperature": 450.0 },
            "Recycler": { "max_overheat_seconds": 120.0, "alert_channel": "Service" }
        }"#;
        let protos = load_prototypes(json).unwrap();
        assert_eq!(protos.len(), 2);
        assert_eq!(protos["Thermomachine"].critical_temperature, 450.0);
        assert_eq!(protos["Recycler"].max_overheat(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_prototypes_names_bad_entry() {
        let json = r#"{ "Heater": { "critical_temperature": 300.0 } }"#;
        let err = load_prototypes(json).unwrap_err();
        assert!(err.to_string().contains("Heater"));
    }
}
