//! Configuration file handling

use std::fs;

use rae_core::{ConfigError, MpeConfig, Simulation};

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
cycle_count = 5
agent_count = 12
s_agent_count = 3
k_min = 2
k_max = 6
expoA = 2.0
expoG = 0.5
s_type = "M"
good_will_x = 0.4
good_will_y = 0.2
good_will_z = 0.1
delta = 0.8
scenario = 0
V_0 = 0.6
"#,
    )
    .unwrap();

    let config = MpeConfig::from_file(&path).unwrap();
    assert_eq!(config.agent_count, 12);
    assert_eq!(config.expo_a, 2.0);
    assert_eq!(config.v_0, 0.6);

    let mut sim = Simulation::new(config, 42).unwrap();
    assert!(sim.agents().iter().all(|a| a.trust == 0.6));
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "cycle_count = 7\n").unwrap();

    let config = MpeConfig::from_file(&path).unwrap();
    assert_eq!(config.cycle_count, 7);
    assert_eq!(config.agent_count, MpeConfig::default().agent_count);
}

#[test]
fn test_unknown_key_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "cycle_count = 7\nticks = 3\n").unwrap();

    assert!(matches!(
        MpeConfig::from_file(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        MpeConfig::from_file(dir.path().join("absent.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_default_config_written_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.toml");
    fs::write(&path, MpeConfig::default().to_toml().unwrap()).unwrap();

    assert_eq!(MpeConfig::from_file(&path).unwrap(), MpeConfig::default());
}

#[test]
fn test_overrides_on_top_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "agent_count = 10\ns_agent_count = 2\nk_min = 1\nk_max = 5\n").unwrap();

    let mut config = MpeConfig::from_file(&path).unwrap();
    config
        .apply_overrides(["delta=0.5", "s_agent_count = 4"])
        .unwrap();
    assert_eq!(config.delta, 0.5);
    assert_eq!(config.s_agent_count, 4);

    let err = config.apply_overrides(["k_max=10"]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidProviderBounds { .. }));
}
