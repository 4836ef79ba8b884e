//! Configuration loading and typed config structures for Cobbleworkers.
//!
//! The configuration lives in `cobbleworkers.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure, and a loader
//! that reads, parses, and validates the file. Every field has a default,
//! so an empty file (or no file) yields a working setup.

use std::collections::BTreeSet;
use std::path::Path;

use cobbleworkers_agents::FatigueConfig;
use cobbleworkers_agents::jobs::{
    ExtinguisherConfig, GathererConfig, GeneratorConfig, HarvesterConfig, HealerConfig,
    IrrigatorConfig, TenderConfig,
};
use cobbleworkers_world::CacheSettings;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which value is wrong and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `cobbleworkers.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkersConfig {
    /// Search volume, cache timing, claims and randomness.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fatigue thresholds and rates.
    #[serde(default)]
    pub fatigue: FatigueConfig,

    /// Crop harvesting.
    #[serde(default)]
    pub harvester: HarvesterConfig,

    /// Loot generation.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Farmland irrigation.
    #[serde(default)]
    pub irrigator: IrrigatorConfig,

    /// Player healing.
    #[serde(default)]
    pub healer: HealerConfig,

    /// Ground item gathering.
    #[serde(default)]
    pub gatherer: GathererConfig,

    /// Fire fighting.
    #[serde(default)]
    pub extinguisher: ExtinguisherConfig,

    /// Brewing fuel, honey and other in-place levels.
    #[serde(default)]
    pub tender: TenderConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Headless tick loop.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl WorkersConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fatigue.validate().map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        self.general.validate()?;

        if self.irrigator.radius < 0 {
            return Err(invalid("irrigator.radius must not be negative"));
        }
        if self.irrigator.max_moisture == 0 {
            return Err(invalid("irrigator.max_moisture must be positive"));
        }
        if self.extinguisher.radius < 0 {
            return Err(invalid("extinguisher.radius must not be negative"));
        }
        if self.harvester.crops.iter().any(|crop| crop.block.trim().is_empty()) {
            return Err(invalid("harvester: every crop needs a block"));
        }

        let mut names = BTreeSet::new();
        for profile in &self.generator.profiles {
            if !names.insert(profile.name.as_str()) {
                return Err(invalid(&format!(
                    "generator profile '{}' is defined twice",
                    profile.name
                )));
            }
            if profile.treasure_chance_percent > 100 {
                return Err(invalid(&format!(
                    "generator profile '{}': treasure_chance_percent exceeds 100",
                    profile.name
                )));
            }
        }

        let mut names = BTreeSet::new();
        for profile in &self.tender.profiles {
            if !names.insert(profile.name.as_str()) {
                return Err(invalid(&format!(
                    "tender profile '{}' is defined twice",
                    profile.name
                )));
            }
            if profile.max_level == 0 || profile.increment == 0 {
                return Err(invalid(&format!(
                    "tender profile '{}': max_level and increment must be positive",
                    profile.name
                )));
            }
        }

        if self.engine.tick_interval_ms == 0 {
            return Err(invalid("engine.tick_interval_ms must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Settings shared by every job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralConfig {
    /// Horizontal half-extent of the search box around a work origin.
    #[serde(default = "default_search_radius")]
    pub search_radius: i32,

    /// Vertical half-extent of the search box.
    #[serde(default = "default_search_height")]
    pub search_height: i32,

    /// Ticks before a cached target list is rescanned.
    #[serde(default = "default_refresh_interval_ticks")]
    pub refresh_interval_ticks: u64,

    /// Ticks without use before a cached target list is dropped.
    #[serde(default = "default_eviction_ticks")]
    pub eviction_ticks: u64,

    /// Distance at which an agent counts as arrived at a block.
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f64,

    /// Ticks after which an unreleased claim goes stale.
    #[serde(default = "default_claim_ttl_ticks")]
    pub claim_ttl_ticks: u64,

    /// Ticks a released target stays unclaimable.
    #[serde(default = "default_claim_cooldown_ticks")]
    pub claim_cooldown_ticks: u64,

    /// Seed for loot table selection.
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
}

impl GeneralConfig {
    /// Cache settings derived from the search fields.
    pub const fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            search_radius: self.search_radius,
            search_height: self.search_height,
            refresh_interval_ticks: self.refresh_interval_ticks,
            eviction_ticks: self.eviction_ticks,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.search_radius <= 0 || self.search_height < 0 {
            return Err(invalid(
                "general: search_radius must be positive and search_height not negative",
            ));
        }
        if !(self.arrival_radius.is_finite() && self.arrival_radius > 0.0) {
            return Err(invalid("general: arrival_radius must be a positive number"));
        }
        if self.claim_ttl_ticks == 0 {
            return Err(invalid("general: claim_ttl_ticks must be positive"));
        }
        Ok(())
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            search_radius: default_search_radius(),
            search_height: default_search_height(),
            refresh_interval_ticks: default_refresh_interval_ticks(),
            eviction_ticks: default_eviction_ticks(),
            arrival_radius: default_arrival_radius(),
            claim_ttl_ticks: default_claim_ttl_ticks(),
            claim_cooldown_ticks: default_claim_cooldown_ticks(),
            rng_seed: default_rng_seed(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Headless engine loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Real-time milliseconds per world tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

const fn default_search_radius() -> i32 {
    8
}

const fn default_search_height() -> i32 {
    5
}

const fn default_refresh_interval_ticks() -> u64 {
    60
}

const fn default_eviction_ticks() -> u64 {
    1200
}

const fn default_arrival_radius() -> f64 {
    1.5
}

const fn default_claim_ttl_ticks() -> u64 {
    600
}

const fn default_claim_cooldown_ticks() -> u64 {
    100
}

const fn default_rng_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_tick_interval_ms() -> u64 {
    50
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WorkersConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.claim_ttl_ticks, 600);
        assert_eq!(config.general.claim_cooldown_ticks, 100);
        assert_eq!(config.fatigue.refuse_threshold, dec!(30));
        assert_eq!(config.generator.profiles.len(), 4);
        assert_eq!(config.tender.profiles.len(), 2);
        assert_eq!(config.extinguisher.radius, 1);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = WorkersConfig::parse("{}");
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config, WorkersConfig::default());
        }
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
general:
  search_radius: 6
  search_height: 3
  refresh_interval_ticks: 40
  eviction_ticks: 600
  arrival_radius: 2.0
  claim_ttl_ticks: 300
  claim_cooldown_ticks: 20
  rng_seed: 7

fatigue:
  max: "100"
  complaining_threshold: "45"
  refuse_threshold: "25"
  resume_threshold: "55"
  work_drain: "0.001"
  rest_recovery: "0.002"
  sleep_multiplier: "3.5"
  min_break_ticks: 600

harvester:
  species: [Bulbasaur]
  types: [grass, bug]
  crops:
    - block: "minecraft:wheat"
      mature_age: 7
      replant_age: 0

generator:
  profiles:
    - name: fuel
      types: [fire]
      cooldown_ticks: 900
      loot_tables: ["cobbleworkers:gameplay/fuel"]

irrigator:
  radius: 3

healer:
  chansey_line: false
  regen_duration_seconds: 5

gatherer:
  types: [psychic, fairy]

extinguisher:
  types: [water, ice]
  radius: 2

tender:
  profiles:
    - name: brewing_fuel
      types: [fire]
      blocks: ["minecraft:brewing_stand"]
      property: fuel
      max_level: 20
      increment: 4

logging:
  level: "debug"
  json: true

engine:
  tick_interval_ms: 10
  max_ticks: 500
"#;

        let config = WorkersConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        if let Ok(config) = config {
            assert_eq!(config.general.search_radius, 6);
            assert_eq!(config.general.cache_settings().refresh_interval_ticks, 40);
            assert_eq!(config.fatigue.resume_threshold, dec!(55));
            assert_eq!(config.fatigue.work_drain, dec!(0.001));
            assert_eq!(config.harvester.crops.len(), 1);
            assert_eq!(config.harvester.types, vec!["grass", "bug"]);
            assert_eq!(config.generator.profiles.len(), 1);
            assert_eq!(
                config.generator.profiles.first().map(|p| p.cooldown_ticks),
                Some(900)
            );
            assert_eq!(config.irrigator.radius, 3);
            assert_eq!(config.irrigator.max_moisture, 7);
            assert!(!config.healer.chansey_line);
            assert_eq!(config.gatherer.types.len(), 2);
            assert_eq!(config.extinguisher.radius, 2);
            assert_eq!(
                config.tender.profiles.first().map(|p| (p.increment, p.cooldown_ticks)),
                Some((4, 1200))
            );
            assert!(config.logging.json);
            assert_eq!(config.engine.max_ticks, 500);
        }
    }

    #[test]
    fn out_of_order_thresholds_are_rejected() {
        let yaml = r#"
fatigue:
  refuse_threshold: "60"
  complaining_threshold: "50"
"#;
        assert!(matches!(
            WorkersConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn duplicate_generator_profiles_are_rejected() {
        let yaml = r#"
generator:
  profiles:
    - name: fuel
      types: [fire]
    - name: fuel
      types: [dragon]
"#;
        assert!(matches!(
            WorkersConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn tender_profiles_need_a_cap() {
        let yaml = r#"
tender:
  profiles:
    - name: honey
      species: [combee]
      blocks: ["minecraft:beehive"]
      property: honey_level
      max_level: 0
"#;
        assert!(matches!(
            WorkersConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn crop_patterns_parse_with_defaults() {
        let yaml = r#"
harvester:
  crops:
    - block: "cobblemon:*_berry"
      mature_age: 5
      replant_age: 3
    - block: "minecraft:amethyst_cluster"
      types: [rock]
"#;
        let config = WorkersConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        if let Ok(config) = config {
            let berry = config.harvester.crops.first();
            assert_eq!(berry.map(|c| c.property.as_str()), Some("age"));
            assert_eq!(berry.and_then(|c| c.replant_age), Some(3));
            let amethyst = config.harvester.crops.get(1);
            assert_eq!(amethyst.and_then(|c| c.replant_age), None);
            assert_eq!(amethyst.map(|c| c.types.len()), Some(1));
        }
    }

    #[test]
    fn zero_search_radius_is_rejected() {
        let yaml = "general:\n  search_radius: 0\n";
        assert!(matches!(
            WorkersConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            WorkersConfig::parse("general: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
