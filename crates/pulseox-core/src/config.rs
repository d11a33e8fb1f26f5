//! Tunable parameters for the oximetry pipeline.
//!
//! Every threshold and smoothing coefficient used by the estimators lives here.
//! The defaults are empirically tuned values; changing them is a
//! calibration decision, not a code change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OximeterConfig {
    pub beat: BeatConfig,
    pub heart_rate: HeartRateConfig,
    pub spo2: Spo2Config,
    pub quality: QualityConfig,
}

/// Peak detection on the IR channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Candidate peak must exceed `mean * peak_threshold_ratio`.
    pub peak_threshold_ratio: f64,
    /// Shortest accepted inter-beat interval (ms).
    pub min_interval_ms: u32,
    /// Longest accepted inter-beat interval (ms).
    pub max_interval_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateConfig {
    pub min_bpm: f32,
    pub max_bpm: f32,
    /// Weight of the previous estimate in the exponential filter.
    pub smoothing: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spo2Config {
    /// `spo2 = intercept - slope * R`
    pub intercept: f32,
    pub slope: f32,
    pub min_percent: f32,
    pub max_percent: f32,
    /// Weight of the previous estimate in the exponential filter.
    pub smoothing: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// IR mean above which a finger is considered present.
    pub finger_threshold: u32,
    pub strength_divisor: f32,
    /// IR peak-to-peak at or below this scores zero variation.
    pub min_variation: f32,
    pub variation_divisor: f32,
    pub stability_divisor: f32,
    pub strength_weight: f32,
    pub variation_weight: f32,
    pub stability_weight: f32,
    /// Quality a reading must exceed to be reported as valid.
    pub valid_threshold: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            peak_threshold_ratio: 1.05,
            min_interval_ms: 300,
            max_interval_ms: 1500,
        }
    }
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            min_bpm: 40.0,
            max_bpm: 200.0,
            smoothing: 0.7,
        }
    }
}

impl Default for Spo2Config {
    fn default() -> Self {
        Self {
            intercept: 110.0,
            slope: 25.0,
            min_percent: 70.0,
            max_percent: 100.0,
            smoothing: 0.8,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            finger_threshold: 50_000,
            strength_divisor: 2000.0,
            min_variation: 100.0,
            variation_divisor: 100.0,
            stability_divisor: 100.0,
            strength_weight: 0.5,
            variation_weight: 0.3,
            stability_weight: 0.2,
            valid_threshold: 30.0,
        }
    }
}

impl OximeterConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from file, then apply `PULSEOX_*` environment overrides.
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: OximeterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply environment variable overrides.
    ///
    /// Example: `PULSEOX_QUALITY_FINGER_THRESHOLD=45000`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        override_from_env(
            "PULSEOX_BEAT_MIN_INTERVAL_MS",
            &mut self.beat.min_interval_ms,
        )?;
        override_from_env(
            "PULSEOX_BEAT_MAX_INTERVAL_MS",
            &mut self.beat.max_interval_ms,
        )?;
        override_from_env(
            "PULSEOX_HEART_RATE_SMOOTHING",
            &mut self.heart_rate.smoothing,
        )?;
        override_from_env("PULSEOX_SPO2_SMOOTHING", &mut self.spo2.smoothing)?;
        override_from_env(
            "PULSEOX_QUALITY_FINGER_THRESHOLD",
            &mut self.quality.finger_threshold,
        )?;
        override_from_env(
            "PULSEOX_QUALITY_VALID_THRESHOLD",
            &mut self.quality.valid_threshold,
        )?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Beat validation
        if !(self.beat.peak_threshold_ratio > 1.0) {
            return Err(ConfigError::Validation(
                "beat.peak_threshold_ratio must be > 1.0".to_string(),
            ));
        }
        if self.beat.min_interval_ms == 0 || self.beat.min_interval_ms >= self.beat.max_interval_ms
        {
            return Err(ConfigError::Validation(
                "beat.min_interval_ms must be in (0, max_interval_ms)".to_string(),
            ));
        }

        // Heart rate validation
        if self.heart_rate.min_bpm <= 0.0 || self.heart_rate.min_bpm >= self.heart_rate.max_bpm {
            return Err(ConfigError::Validation(
                "heart_rate.min_bpm must be in (0, max_bpm)".to_string(),
            ));
        }
        check_smoothing("heart_rate.smoothing", self.heart_rate.smoothing)?;

        // SpO2 validation
        if self.spo2.min_percent < 0.0
            || self.spo2.max_percent > 100.0
            || self.spo2.min_percent >= self.spo2.max_percent
        {
            return Err(ConfigError::Validation(
                "spo2 clamp must satisfy 0 <= min_percent < max_percent <= 100".to_string(),
            ));
        }
        check_smoothing("spo2.smoothing", self.spo2.smoothing)?;

        // Quality validation
        let q = &self.quality;
        if q.strength_divisor <= 0.0 || q.variation_divisor <= 0.0 || q.stability_divisor <= 0.0 {
            return Err(ConfigError::Validation(
                "quality divisors must be positive".to_string(),
            ));
        }
        let weights = [q.strength_weight, q.variation_weight, q.stability_weight];
        if weights.iter().any(|&w| w < 0.0) {
            return Err(ConfigError::Validation(
                "quality weights must be non-negative".to_string(),
            ));
        }
        if (weights.iter().sum::<f32>() - 1.0).abs() > 1e-3 {
            return Err(ConfigError::Validation(
                "quality weights must sum to 1.0".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&q.valid_threshold) {
            return Err(ConfigError::Validation(
                "quality.valid_threshold must be in [0, 100]".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_smoothing(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&value) {
        return Err(ConfigError::Validation(format!("{name} must be in [0, 1)")));
    }
    Ok(())
}

fn override_from_env<T: std::str::FromStr>(key: &str, slot: &mut T) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var(key) {
        *slot = val
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation(format!("Invalid {key}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_valid() {
        assert!(OximeterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_tuned_constants() {
        let config = OximeterConfig::default();
        assert_eq!(config.beat.min_interval_ms, 300);
        assert_eq!(config.beat.max_interval_ms, 1500);
        assert_eq!(config.quality.finger_threshold, 50_000);
        assert_eq!(config.heart_rate.smoothing, 0.7);
        assert_eq!(config.spo2.smoothing, 0.8);
    }

    #[test]
    fn test_validation_rejects_bad_intervals() {
        let mut config = OximeterConfig::default();
        config.beat.min_interval_ms = 2000;
        assert!(config.validate().is_err());

        config.beat.min_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_smoothing() {
        let mut config = OximeterConfig::default();
        config.heart_rate.smoothing = 1.0;
        assert!(config.validate().is_err());

        config.heart_rate.smoothing = 0.7;
        config.spo2.smoothing = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unbalanced_weights() {
        let mut config = OximeterConfig::default();
        config.quality.stability_weight = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_inverted_spo2_clamp() {
        let mut config = OximeterConfig::default();
        config.spo2.min_percent = 100.0;
        config.spo2.max_percent = 70.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [quality]
            finger_threshold = 45000

            [heart_rate]
            smoothing = 0.5
        "#;
        let config = OximeterConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.quality.finger_threshold, 45_000);
        assert_eq!(config.heart_rate.smoothing, 0.5);
        assert_eq!(config.beat, BeatConfig::default());
        assert_eq!(config.spo2, Spo2Config::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = OximeterConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[beat]"));
        assert!(toml_str.contains("finger_threshold"));

        let parsed = OximeterConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[beat]\nmin_interval_ms = 250").unwrap();

        let config = OximeterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.beat.min_interval_ms, 250);
    }

    #[test]
    fn test_from_file_missing() {
        let result = OximeterConfig::from_file("/nonexistent/pulseox.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_toml_value_is_parse_error() {
        let result = OximeterConfig::from_toml_str("[beat]\nmin_interval_ms = \"fast\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    /// Serializes tests that touch `PULSEOX_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_env_override() {
        let _guard = env_guard();
        let mut config = OximeterConfig::default();
        std::env::set_var("PULSEOX_QUALITY_VALID_THRESHOLD", "42.5");
        let result = config.apply_env_overrides();
        std::env::remove_var("PULSEOX_QUALITY_VALID_THRESHOLD");

        assert!(result.is_ok());
        assert_eq!(config.quality.valid_threshold, 42.5);
    }

    #[test]
    fn test_env_override_invalid_value() {
        let _guard = env_guard();
        let mut config = OximeterConfig::default();
        std::env::set_var("PULSEOX_BEAT_MAX_INTERVAL_MS", "slow");
        let result = config.apply_env_overrides();
        std::env::remove_var("PULSEOX_BEAT_MAX_INTERVAL_MS");

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
