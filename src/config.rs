use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
///
/// Every section has working defaults, so a missing or empty config file
/// yields the stock scoring weights (0.3/0.4/0.2/0.1), the 0.7 plagiarism
/// threshold, and a one-second worker tick.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

/// Combination weights and the plagiarism threshold.
///
/// The four weights must sum to 1.0; [`load_config`] enforces this so
/// operators can retune sensitivity without touching scoring code.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_text_weight")]
    pub text_weight: f64,
    #[serde(default = "default_image_weight")]
    pub image_weight: f64,
    #[serde(default = "default_structure_weight")]
    pub structure_weight: f64,
    #[serde(default = "default_metadata_weight")]
    pub metadata_weight: f64,
    /// Comparisons scoring strictly above this become network edges.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            text_weight: default_text_weight(),
            image_weight: default_image_weight(),
            structure_weight: default_structure_weight(),
            metadata_weight: default_metadata_weight(),
            threshold: default_threshold(),
        }
    }
}

fn default_text_weight() -> f64 {
    0.3
}
fn default_image_weight() -> f64 {
    0.4
}
fn default_structure_weight() -> f64 {
    0.2
}
fn default_metadata_weight() -> f64 {
    0.1
}
fn default_threshold() -> f64 {
    0.7
}

/// Background worker settings.
#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    /// Fixed wall-clock interval between worker ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Validate configuration invariants. Called by [`load_config`]; exposed so
/// programmatically built configs can be checked too.
pub fn validate(config: &Config) -> Result<()> {
    let s = &config.scoring;
    for (name, w) in [
        ("scoring.text_weight", s.text_weight),
        ("scoring.image_weight", s.image_weight),
        ("scoring.structure_weight", s.structure_weight),
        ("scoring.metadata_weight", s.metadata_weight),
    ] {
        if !(0.0..=1.0).contains(&w) {
            anyhow::bail!("{} must be in [0.0, 1.0], got {}", name, w);
        }
    }

    let sum = s.text_weight + s.image_weight + s.structure_weight + s.metadata_weight;
    if (sum - 1.0).abs() > 1e-9 {
        anyhow::bail!("scoring weights must sum to 1.0, got {}", sum);
    }

    if !(0.0..=1.0).contains(&s.threshold) {
        anyhow::bail!("scoring.threshold must be in [0.0, 1.0], got {}", s.threshold);
    }

    if config.queue.tick_interval_ms == 0 {
        anyhow::bail!("queue.tick_interval_ms must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.scoring.threshold, 0.7);
        assert_eq!(config.queue.tick_interval_ms, 1000);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = Config::default();
        config.scoring.text_weight = 0.5;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"), "{}", err);
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let mut config = Config::default();
        config.scoring.threshold = 1.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let mut config = Config::default();
        config.queue.tick_interval_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[scoring]\nthreshold = 0.9\n").unwrap();
        assert_eq!(config.scoring.threshold, 0.9);
        assert_eq!(config.scoring.text_weight, 0.3);
        assert_eq!(config.queue.tick_interval_ms, 1000);
        assert!(validate(&config).is_ok());
    }
}
