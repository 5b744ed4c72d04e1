// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 默认值 / 覆写 / 格式错误回退 / 阈值自洽校验
// ==========================================


use std::sync::{Arc, Mutex};

use bombona_monitor::app::AppState;
use bombona_monitor::config::{config_keys, ConfigManager, MonitorThresholds, SimulatorSettings};
use bombona_monitor::domain::types::{AlertType, ContainerStatus};
use test_helpers::{create_test_db, open_test_connection, seed_container, TEST_COMPANY_ID};

#[test]
fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(config.load_thresholds().unwrap(), MonitorThresholds::default());
    assert_eq!(
        config.load_simulator_settings().unwrap(),
        SimulatorSettings::default()
    );
}

#[test]
fn test_override_and_read_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config
        .set_global_config_value(config_keys::LEVEL_HIGH_PCT, "70")
        .unwrap();
    config
        .set_global_config_value(config_keys::SIM_TICK_INTERVAL_SECS, "60")
        .unwrap();
    // 覆写同一个键
    config
        .set_global_config_value(config_keys::LEVEL_HIGH_PCT, "75")
        .unwrap();

    assert_eq!(
        config
            .get_global_config_value(config_keys::LEVEL_HIGH_PCT)
            .unwrap()
            .as_deref(),
        Some("75")
    );
    assert_eq!(config.load_thresholds().unwrap().level_high_pct, 75.0);
    assert_eq!(config.load_simulator_settings().unwrap().tick_interval_secs, 60);
}

#[test]
fn test_malformed_value_falls_back_to_default() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config
        .set_global_config_value(config_keys::TEMPERATURE_HIGH_C, "quente")
        .unwrap();
    config
        .set_global_config_value(config_keys::SIM_SKIP_PROBABILITY, "abc")
        .unwrap();

    assert_eq!(config.load_thresholds().unwrap().temperature_high_c, 40.0);
    assert_eq!(config.load_simulator_settings().unwrap().skip_probability, 0.2);
}

#[test]
fn test_inconsistent_thresholds_use_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config
        .set_global_config_value(config_keys::LEVEL_HIGH_PCT, "96")
        .unwrap();

    assert_eq!(config.load_thresholds().unwrap(), MonitorThresholds::default());
}

#[test]
fn test_app_state_applies_configured_thresholds() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = Arc::new(Mutex::new(
        open_test_connection(&db_path).expect("Failed to open db"),
    ));
    {
        let config = ConfigManager::from_connection(conn.clone()).unwrap();
        config
            .set_global_config_value(config_keys::LEVEL_HIGH_PCT, "50")
            .unwrap();
        config
            .set_global_config_value(config_keys::TEMPERATURE_HIGH_C, "30")
            .unwrap();
    }

    let state = AppState::from_connection(db_path, conn).expect("Failed to create AppState");
    assert_eq!(state.thresholds.level_high_pct, 50.0);

    state
        .monitor_api
        .register_company(&bombona_monitor::Company::new(
            TEST_COMPANY_ID,
            "Clínica Config",
            "11.111.111/0001-11",
        ))
        .unwrap();
    seed_container(&state, "CFG-001", 100.0, 0.0);

    let reading = state.monitor_api.apply_reading("CFG-001", 55.0, 31.0).unwrap();
    assert!(reading.is_some());
    assert_eq!(
        state.monitor_api.get_container("CFG-001").unwrap().status,
        ContainerStatus::NearFull
    );

    let mut types: Vec<_> = state
        .monitor_api
        .list_open_alerts("CFG-001")
        .unwrap()
        .into_iter()
        .map(|a| a.alert_type)
        .collect();
    types.sort_by_key(|t| t.to_db_str());
    assert_eq!(types, vec![AlertType::LevelHigh, AlertType::TemperatureHigh]);
}

#[test]
fn test_non_finite_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config
        .set_global_config_value(config_keys::SIM_TEMPERATURE_VARIATION_C, "NaN")
        .unwrap();
    config
        .set_global_config_value(config_keys::SIM_TEMPERATURE_BASE_C, "inf")
        .unwrap();
    config
        .set_global_config_value(config_keys::TEMPERATURE_HIGH_C, "NaN")
        .unwrap();
    config
        .set_global_config_value(config_keys::LEVEL_HIGH_PCT, "70")
        .unwrap();

    let settings = config.load_simulator_settings().unwrap();
    assert_eq!(settings.temperature_variation_c, 5.0);
    assert_eq!(settings.temperature_base_c, 25.0);

    // 只有非有限的键回退, 其余覆写仍生效
    let thresholds = config.load_thresholds().unwrap();
    assert_eq!(thresholds.temperature_high_c, 40.0);
    assert_eq!(thresholds.level_high_pct, 70.0);
}
