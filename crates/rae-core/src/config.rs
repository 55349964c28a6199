//! Configuration System
//!
//! The run configuration is loaded from a TOML file (or taken from the
//! defaults), optionally patched field by field with `KEY=VALUE` overrides and
//! validated once before any cycle runs.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::systems::providers::ProviderBounds;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Service-type string selecting the multiplicative policy
pub const MULTIPLICATIVE_S_TYPE: &str = "m";

/// Every key accepted by [`MpeConfig::set`], in file order.
pub const CONFIG_FIELDS: [&str; 14] = [
    "cycle_count",
    "agent_count",
    "s_agent_count",
    "k_min",
    "k_max",
    "expoA",
    "expoG",
    "s_type",
    "good_will_x",
    "good_will_y",
    "good_will_z",
    "delta",
    "scenario",
    "V_0",
];

/// Parameters of one simulation run.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MpeConfig {
    /// Number of cycles to simulate
    pub cycle_count: u32,
    /// Total population size
    pub agent_count: usize,
    /// How many of the agents are strategic; the rest are honest
    pub s_agent_count: usize,
    /// Inclusive lower bound on providers drawn per agent and cycle
    pub k_min: usize,
    /// Exclusive upper bound on providers drawn per agent and cycle
    pub k_max: usize,
    /// Shape of the available-services distribution
    #[serde(rename = "expoA")]
    pub expo_a: f64,
    /// Shape of the receiver-efficiency distribution
    #[serde(rename = "expoG")]
    pub expo_g: f64,
    /// "m" for multiplicative services, anything else for capped
    pub s_type: String,
    /// Honest agents' good will
    pub good_will_x: f64,
    /// Strategic providers' good will in scenario 0
    pub good_will_y: f64,
    /// Strategic receivers' good will in scenario 0
    pub good_will_z: f64,
    /// Per-cycle decay applied to older evidence
    pub delta: f64,
    /// 0 selects good-will thresholds for strategic agents
    pub scenario: i64,
    /// Initial trust of every agent
    #[serde(rename = "V_0")]
    pub v_0: f64,
}

impl Default for MpeConfig {
    fn default() -> Self {
        Self {
            cycle_count: 50,
            agent_count: 100,
            s_agent_count: 20,
            k_min: 5,
            k_max: 10,
            expo_a: 1.0,
            expo_g: 1.0,
            s_type: "c".to_string(),
            good_will_x: 0.5,
            good_will_y: 0.3,
            good_will_z: 0.3,
            delta: 0.9,
            scenario: 0,
            v_0: 0.5,
        }
    }
}

/// How thresholds combine with drawn quantities during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePolicy {
    /// `provided = available * threshold`
    Multiplicative,
    /// `provided = min(available, threshold)`
    Capped,
}

impl ServicePolicy {
    /// Case-insensitive: "m" is multiplicative, everything else is capped.
    pub fn from_s_type(s_type: &str) -> Self {
        if s_type.eq_ignore_ascii_case(MULTIPLICATIVE_S_TYPE) {
            ServicePolicy::Multiplicative
        } else {
            ServicePolicy::Capped
        }
    }
}

/// Thresholds used by strategic agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategicPolicy {
    /// Scenario 0: fixed good-will constants
    GoodWill,
    /// Any other scenario: full cooperation
    FullCooperation,
}

impl StrategicPolicy {
    pub fn from_scenario(scenario: i64) -> Self {
        if scenario == 0 {
            StrategicPolicy::GoodWill
        } else {
            StrategicPolicy::FullCooperation
        }
    }
}

impl MpeConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MpeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path, or use defaults if not found
    pub fn load_or_default() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            tracing::warn!("{} not found, using default configuration", DEFAULT_CONFIG_PATH);
            Ok(Self::default())
        }
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn service_policy(&self) -> ServicePolicy {
        ServicePolicy::from_s_type(&self.s_type)
    }

    pub fn strategic_policy(&self) -> StrategicPolicy {
        StrategicPolicy::from_scenario(self.scenario)
    }

    /// Number of honest agents in the population.
    pub fn honest_agent_count(&self) -> usize {
        self.agent_count.saturating_sub(self.s_agent_count)
    }

    /// Sets one field from its textual value.
    ///
    /// Accepts exactly the keys in [`CONFIG_FIELDS`]. The value is parsed but
    /// range checks are left to [`MpeConfig::validate`], so several fields can
    /// be changed together before the combination is checked.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match field {
            "cycle_count" => self.cycle_count = parse_field("cycle_count", value)?,
            "agent_count" => self.agent_count = parse_field("agent_count", value)?,
            "s_agent_count" => self.s_agent_count = parse_field("s_agent_count", value)?,
            "k_min" => self.k_min = parse_field("k_min", value)?,
            "k_max" => self.k_max = parse_field("k_max", value)?,
            "expoA" => self.expo_a = parse_field("expoA", value)?,
            "expoG" => self.expo_g = parse_field("expoG", value)?,
            "s_type" => self.s_type = value.to_string(),
            "good_will_x" => self.good_will_x = parse_field("good_will_x", value)?,
            "good_will_y" => self.good_will_y = parse_field("good_will_y", value)?,
            "good_will_z" => self.good_will_z = parse_field("good_will_z", value)?,
            "delta" => self.delta = parse_field("delta", value)?,
            "scenario" => self.scenario = parse_field("scenario", value)?,
            "V_0" => self.v_0 = parse_field("V_0", value)?,
            other => return Err(ConfigError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Applies `KEY=VALUE` overrides in order, then validates the result.
    pub fn apply_overrides<I, S>(&mut self, overrides: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in overrides {
            let entry = entry.as_ref();
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedOverride(entry.to_string()))?;
            self.set(key.trim(), value)?;
        }
        self.validate()
    }

    /// Checks every range constraint. Called before any cycle runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_count == 0 {
            return Err(ConfigError::ZeroCount { field: "cycle_count" });
        }
        if self.agent_count == 0 {
            return Err(ConfigError::ZeroCount { field: "agent_count" });
        }
        if self.s_agent_count > self.agent_count {
            return Err(ConfigError::TooManyStrategic {
                s_agent_count: self.s_agent_count,
                agent_count: self.agent_count,
            });
        }

        ProviderBounds::new(self.k_min, self.k_max, self.agent_count)?;

        for (field, value) in [("expoA", self.expo_a), ("expoG", self.expo_g)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveExponent { field, value });
            }
        }

        for (field, value) in [
            ("good_will_x", self.good_will_x),
            ("good_will_y", self.good_will_y),
            ("good_will_z", self.good_will_z),
            ("V_0", self.v_0),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "[0, 1]",
                });
            }
        }

        if !(0.0..1.0).contains(&self.delta) {
            return Err(ConfigError::OutOfRange {
                field: "delta",
                value: self.delta,
                expected: "[0, 1)",
            });
        }

        Ok(())
    }
}

fn parse_field<T>(field: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unknown configuration field '{0}'")]
    UnknownField(String),
    #[error("malformed override '{0}', expected KEY=VALUE")]
    MalformedOverride(String),
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("{field} must be greater than zero")]
    ZeroCount { field: &'static str },
    #[error("s_agent_count ({s_agent_count}) exceeds agent_count ({agent_count})")]
    TooManyStrategic {
        s_agent_count: usize,
        agent_count: usize,
    },
    #[error("invalid provider bounds k_min={k_min}, k_max={k_max} for {agent_count} agents: {reason}")]
    InvalidProviderBounds {
        k_min: usize,
        k_max: usize,
        agent_count: usize,
        reason: &'static str,
    },
    #[error("{field} must be > 0, got {value}")]
    NonPositiveExponent { field: &'static str, value: f64 },
    #[error("{field} = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}
