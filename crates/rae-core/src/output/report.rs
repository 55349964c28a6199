//! Simulation Report
//!
//! The end product of a run: the per-archetype trust time series together
//! with the configuration and seed that produced it.

use rae_events::{Archetype, TrustHistory};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::components::agent::AgentState;
use crate::config::MpeConfig;
use crate::error::SimError;

/// Default report path
pub const DEFAULT_REPORT_PATH: &str = "output/trust_history.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub seed: u64,
    pub cycles_completed: u32,
    pub config: MpeConfig,
    pub history: TrustHistory,
    pub final_agents: Vec<AgentState>,
}

impl SimulationReport {
    /// Mean trust of an archetype after the last cycle.
    pub fn final_mean(&self, archetype: Archetype) -> Option<f64> {
        self.history.latest().and_then(|s| s.mean_for(archetype))
    }

    pub fn min_trust(&self, archetype: Archetype) -> Option<f64> {
        self.final_agents
            .iter()
            .filter(|a| a.archetype == archetype)
            .map(|a| a.trust)
            .reduce(f64::min)
    }
}

/// Writes the report as pretty-printed JSON, creating parent directories.
pub fn write_report(report: &SimulationReport, path: impl AsRef<Path>) -> Result<(), SimError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_report(path: impl AsRef<Path>) -> Result<SimulationReport, SimError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rae_events::fixtures::sample_history;

    fn report() -> SimulationReport {
        SimulationReport {
            run_id: Uuid::new_v4(),
            seed: 42,
            cycles_completed: 4,
            config: MpeConfig::default(),
            history: sample_history(),
            final_agents: vec![
                AgentState::strategic(0, 0.2),
                AgentState::strategic(1, 0.4),
                AgentState::honest(2, 1.0),
            ],
        }
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        write_report(&report(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_report_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let original = report();

        write_report(&original, &path).unwrap();
        let loaded = read_report(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_config_keys_keep_their_names() {
        let json = serde_json::to_value(report()).unwrap();
        let config = &json["config"];
        assert!(config.get("expoA").is_some());
        assert!(config.get("V_0").is_some());
        assert_eq!(json["seed"], 42);
    }

    #[test]
    fn test_min_trust() {
        let report = report();
        assert_eq!(report.min_trust(Archetype::Strategic), Some(0.2));
        assert_eq!(report.min_trust(Archetype::Honest), Some(1.0));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_report(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
