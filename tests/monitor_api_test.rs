// ==========================================
// MonitorApi 集成测试
// ==========================================
// 测试目标: 读数 → 状态 → 告警去重; 告警解决; 复位; 手动状态; 系统快照
// ==========================================


#[cfg(test)]
mod monitor_api_test {
    use std::sync::Arc;

    use bombona_monitor::api::{ApiError, MonitorApi, RESET_NOTE};
    use bombona_monitor::container_lock::ContainerLockManager;
    use bombona_monitor::domain::types::{AlertSeverity, AlertType, ContainerStatus};
    use bombona_monitor::domain::{Container, OccupancyGauge};

    use crate::test_helpers::{seed_container, setup_env, TEST_COMPANY_ID};

    fn open_types(env: &crate::test_helpers::TestEnv, id: &str) -> Vec<AlertType> {
        let mut types: Vec<AlertType> = env
            .state
            .monitor_api
            .list_open_alerts(id)
            .unwrap()
            .into_iter()
            .map(|a| a.alert_type)
            .collect();
        types.sort_by_key(|t| t.to_db_str());
        types
    }

    // ==========================================
    // 读数与告警
    // ==========================================

    #[test]
    fn test_reading_scenario_near_full_with_two_alerts() {
        let env = setup_env();
        seed_container(&env.state, "CNT-HOS-001", 200.0, 150.0);
        let api = &env.state.monitor_api;

        let outcome = api
            .apply_sample(
                "CNT-HOS-001",
                bombona_monitor::ReadingSample::new(10.0, 42.0),
                false,
            )
            .unwrap()
            .expect("active container must produce a reading");

        assert_eq!(outcome.reading.weight_kg, 160.0);
        assert_eq!(outcome.status, ContainerStatus::NearFull);
        assert_eq!(outcome.new_alerts.len(), 2);

        let container = api.get_container("CNT-HOS-001").unwrap();
        assert_eq!(container.current_weight_kg, 160.0);
        assert_eq!(container.temperature_c, 42.0);
        assert_eq!(container.status, ContainerStatus::NearFull);
        assert!(container.last_reading_at.is_some());

        let alerts = api.list_open_alerts("CNT-HOS-001").unwrap();
        let level = alerts
            .iter()
            .find(|a| a.alert_type == AlertType::LevelHigh)
            .unwrap();
        assert_eq!(level.severity, AlertSeverity::High);
        assert!(level.description.contains("CNT-HOS-001"));
        let temp = alerts
            .iter()
            .find(|a| a.alert_type == AlertType::TemperatureHigh)
            .unwrap();
        assert_eq!(temp.severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_repeated_breach_does_not_duplicate_alerts() {
        let env = setup_env();
        seed_container(&env.state, "CNT-DUP-001", 200.0, 150.0);
        let api = &env.state.monitor_api;

        api.apply_reading("CNT-DUP-001", 10.0, 42.0).unwrap();
        api.apply_reading("CNT-DUP-001", 1.0, 43.0).unwrap();
        api.apply_reading("CNT-DUP-001", 1.0, 44.0).unwrap();

        assert_eq!(
            open_types(&env, "CNT-DUP-001"),
            vec![AlertType::LevelHigh, AlertType::TemperatureHigh]
        );
        assert!(api.evaluate_alerts("CNT-DUP-001").unwrap().is_empty());
        assert_eq!(api.list_readings("CNT-DUP-001", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_critical_and_high_are_independent_types() {
        let env = setup_env();
        seed_container(&env.state, "CNT-LVL-001", 200.0, 150.0);
        let api = &env.state.monitor_api;

        api.apply_reading("CNT-LVL-001", 10.0, 25.0).unwrap();
        api.apply_reading("CNT-LVL-001", 35.0, 25.0).unwrap();

        let container = api.get_container("CNT-LVL-001").unwrap();
        assert_eq!(container.current_weight_kg, 195.0);
        assert_eq!(container.status, ContainerStatus::Full);
        // level_high 仍未解决, level_critical 另起一条
        assert_eq!(
            open_types(&env, "CNT-LVL-001"),
            vec![AlertType::LevelCritical, AlertType::LevelHigh]
        );
    }

    #[test]
    fn test_weight_is_clamped_to_capacity_and_zero() {
        let env = setup_env();
        seed_container(&env.state, "CNT-CLP-001", 200.0, 190.0);
        let api = &env.state.monitor_api;

        let reading = api.apply_reading("CNT-CLP-001", 50.0, 25.0).unwrap().unwrap();
        assert_eq!(reading.weight_kg, 200.0);

        let reading = api.apply_reading("CNT-CLP-001", -500.0, 25.0).unwrap().unwrap();
        assert_eq!(reading.weight_kg, 0.0);
        assert_eq!(
            api.get_container("CNT-CLP-001").unwrap().status,
            ContainerStatus::Normal
        );
    }

    #[test]
    fn test_inactive_container_ignores_readings() {
        let env = setup_env();
        seed_container(&env.state, "CNT-OFF-001", 200.0, 100.0);
        let api = &env.state.monitor_api;

        let container = api.set_active("CNT-OFF-001", false).unwrap();
        assert_eq!(container.status, ContainerStatus::Inactive);

        assert!(api.apply_reading("CNT-OFF-001", 90.0, 50.0).unwrap().is_none());

        let container = api.get_container("CNT-OFF-001").unwrap();
        assert_eq!(container.current_weight_kg, 100.0);
        assert!(container.last_reading_at.is_none());
        assert!(api.list_readings("CNT-OFF-001", 10).unwrap().is_empty());
        assert!(api.list_open_alerts("CNT-OFF-001").unwrap().is_empty());

        let container = api.set_active("CNT-OFF-001", true).unwrap();
        assert_eq!(container.status, ContainerStatus::Normal);
    }

    #[test]
    fn test_unknown_container_is_not_found() {
        let env = setup_env();
        let api = &env.state.monitor_api;

        assert!(matches!(
            api.apply_reading("CNT-NOPE", 1.0, 25.0),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(api.reset_container("CNT-NOPE"), Err(ApiError::NotFound(_))));
        assert!(matches!(
            api.resolve_all_open("CNT-NOPE", "x"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_container_ids_leave_no_lock_entries() {
        let env = setup_env();
        seed_container(&env.state, "CNT-LCK-001", 200.0, 10.0);
        let locks = Arc::new(ContainerLockManager::new());
        let api = MonitorApi::new(env.state.conn.clone(), locks.clone(), env.state.thresholds);

        for i in 0..50 {
            let id = format!("CNT-GHOST-{:03}", i);
            assert!(matches!(
                api.apply_reading(&id, 1.0, 25.0),
                Err(ApiError::NotFound(_))
            ));
        }
        api.apply_reading("CNT-LCK-001", 1.0, 25.0).unwrap();

        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_non_finite_reading_is_rejected() {
        let env = setup_env();
        seed_container(&env.state, "CNT-NAN-001", 200.0, 10.0);

        assert!(matches!(
            env.state.monitor_api.apply_reading("CNT-NAN-001", f64::NAN, 25.0),
            Err(ApiError::InvalidInput(_))
        ));
    }

    // ==========================================
    // 告警解决
    // ==========================================

    #[test]
    fn test_resolve_alert_and_new_instance_on_next_breach() {
        let env = setup_env();
        seed_container(&env.state, "CNT-RES-001", 200.0, 20.0);
        let api = &env.state.monitor_api;

        let first = api
            .apply_sample("CNT-RES-001", bombona_monitor::ReadingSample::new(0.0, 45.0), false)
            .unwrap()
            .unwrap()
            .new_alerts;
        assert_eq!(first.len(), 1);
        let alert_id = first[0].alert_id.clone();

        let resolved = api.resolve_alert(&alert_id, "ventilação ajustada").unwrap();
        assert!(resolved.resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolution_notes.as_deref(), Some("ventilação ajustada"));

        assert!(matches!(
            api.resolve_alert(&alert_id, "again"),
            Err(ApiError::InvalidTransition { .. })
        ));
        assert!(matches!(
            api.resolve_alert("no-such-alert", "x"),
            Err(ApiError::NotFound(_))
        ));

        let second = api.apply_reading("CNT-RES-001", 0.0, 46.0).unwrap();
        assert!(second.is_some());
        let all = api.list_alerts("CNT-RES-001").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|a| !a.resolved).count(), 1);
        assert_ne!(
            all.iter().find(|a| !a.resolved).unwrap().alert_id,
            alert_id
        );
    }

    #[test]
    fn test_sustained_critical_occupancy_opens_single_critical_alert() {
        let env = setup_env();
        seed_container(&env.state, "CNT-CRT-001", 200.0, 192.0);
        let api = &env.state.monitor_api;

        for _ in 0..5 {
            api.apply_reading("CNT-CRT-001", 0.0, 25.0).unwrap();
        }

        let container = api.get_container("CNT-CRT-001").unwrap();
        assert_eq!(container.occupancy_pct(), 96.0);
        assert_eq!(container.status, ContainerStatus::Full);

        let open = api.list_open_alerts("CNT-CRT-001").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].alert_type, AlertType::LevelCritical);
        assert_eq!(open[0].severity, AlertSeverity::Critical);
        let first_id = open[0].alert_id.clone();

        api.resolve_alert(&first_id, "coleta agendada").unwrap();
        assert!(api.list_open_alerts("CNT-CRT-001").unwrap().is_empty());

        // 下一次读数仍然越限: 新建一条告警实例
        api.apply_reading("CNT-CRT-001", 0.0, 25.0).unwrap();
        let open = api.list_open_alerts("CNT-CRT-001").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].alert_type, AlertType::LevelCritical);
        assert_ne!(open[0].alert_id, first_id);
        assert_eq!(api.list_alerts("CNT-CRT-001").unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_all_open_returns_count() {
        let env = setup_env();
        seed_container(&env.state, "CNT-ALL-001", 200.0, 150.0);
        let api = &env.state.monitor_api;

        api.apply_reading("CNT-ALL-001", 10.0, 42.0).unwrap();
        assert_eq!(api.resolve_all_open("CNT-ALL-001", "vistoria").unwrap(), 2);
        assert_eq!(api.resolve_all_open("CNT-ALL-001", "vistoria").unwrap(), 0);
        assert!(api.list_open_alerts("CNT-ALL-001").unwrap().is_empty());
    }

    // ==========================================
    // 复位
    // ==========================================

    #[test]
    fn test_reset_container_clears_weight_and_alerts() {
        let env = setup_env();
        seed_container(&env.state, "CNT-RST-001", 200.0, 185.0);
        let api = &env.state.monitor_api;

        api.set_maintenance("CNT-RST-001", true).unwrap();
        api.apply_reading("CNT-RST-001", 10.0, 41.0).unwrap();
        assert_eq!(
            open_types(&env, "CNT-RST-001"),
            vec![
                AlertType::LevelCritical,
                AlertType::Maintenance,
                AlertType::TemperatureHigh
            ]
        );

        let container = api.reset_container("CNT-RST-001").unwrap();
        assert_eq!(container.current_weight_kg, 0.0);
        assert_eq!(container.status, ContainerStatus::Normal);
        assert_eq!(container.temperature_c, 41.0);

        let alerts = api.list_alerts("CNT-RST-001").unwrap();
        assert_eq!(alerts.len(), 3);
        assert!(alerts
            .iter()
            .all(|a| a.resolved && a.resolution_notes.as_deref() == Some(RESET_NOTE)));
        assert!(api.list_open_alerts("CNT-RST-001").unwrap().is_empty());
    }

    #[test]
    fn test_reset_full_containers_only_touches_full() {
        let env = setup_env();
        seed_container(&env.state, "CNT-F-001", 200.0, 195.0);
        seed_container(&env.state, "CNT-F-002", 200.0, 199.0);
        seed_container(&env.state, "CNT-N-001", 200.0, 170.0);
        let api = &env.state.monitor_api;

        assert_eq!(api.reset_full_containers().unwrap(), 2);
        assert_eq!(api.get_container("CNT-F-001").unwrap().current_weight_kg, 0.0);
        assert_eq!(api.get_container("CNT-F-002").unwrap().current_weight_kg, 0.0);
        assert_eq!(api.get_container("CNT-N-001").unwrap().current_weight_kg, 170.0);
        assert_eq!(api.reset_full_containers().unwrap(), 0);
    }

    // ==========================================
    // 维护
    // ==========================================

    #[test]
    fn test_maintenance_is_sticky_until_cleared() {
        let env = setup_env();
        seed_container(&env.state, "CNT-MNT-001", 200.0, 50.0);
        let api = &env.state.monitor_api;

        let container = api.set_maintenance("CNT-MNT-001", true).unwrap();
        assert_eq!(container.status, ContainerStatus::Maintenance);
        assert_eq!(open_types(&env, "CNT-MNT-001"), vec![AlertType::Maintenance]);

        api.apply_reading("CNT-MNT-001", 120.0, 25.0).unwrap();
        let container = api.get_container("CNT-MNT-001").unwrap();
        assert_eq!(container.current_weight_kg, 170.0);
        assert_eq!(container.status, ContainerStatus::Maintenance);

        let container = api.set_maintenance("CNT-MNT-001", false).unwrap();
        assert_eq!(container.status, ContainerStatus::NearFull);
        assert_eq!(open_types(&env, "CNT-MNT-001"), vec![AlertType::LevelHigh]);
    }

    // ==========================================
    // 开通 & 查询
    // ==========================================

    #[test]
    fn test_register_container_validation() {
        let env = setup_env();
        let api = &env.state.monitor_api;

        let zero = Container::new("CNT-Z".into(), TEST_COMPANY_ID.into(), 0.0, "quimico".into());
        assert!(matches!(
            api.register_container(zero),
            Err(ApiError::InvariantViolation(_))
        ));

        let orphan = Container::new("CNT-O".into(), "EMP-NOPE".into(), 100.0, "quimico".into());
        assert!(matches!(api.register_container(orphan), Err(ApiError::NotFound(_))));

        let mut dirty = Container::new("CNT-D".into(), TEST_COMPANY_ID.into(), 100.0, "quimico".into());
        dirty.current_weight_kg = 99.0;
        dirty.status = ContainerStatus::Full;
        let created = api.register_container(dirty).unwrap();
        assert_eq!(created.current_weight_kg, 0.0);
        assert_eq!(created.status, ContainerStatus::Normal);
    }

    #[test]
    fn test_system_status_snapshot() {
        let env = setup_env();
        seed_container(&env.state, "CNT-S-001", 200.0, 150.0);
        seed_container(&env.state, "CNT-S-002", 200.0, 10.0);
        let api = &env.state.monitor_api;

        api.apply_reading("CNT-S-001", 10.0, 42.0).unwrap();
        api.apply_reading("CNT-S-002", 1.0, 25.0).unwrap();

        let status = api.system_status().unwrap();
        assert_eq!(status.total_containers, 2);
        assert_eq!(status.containers_by_status["near_full"], 1);
        assert_eq!(status.containers_by_status["normal"], 1);
        assert_eq!(status.containers_by_status["full"], 0);
        assert_eq!(status.open_alerts, 2);
        assert_eq!(status.open_alerts_by_severity["high"], 1);
        assert_eq!(status.open_alerts_by_severity["medium"], 1);
        assert_eq!(status.readings_last_24h, 2);

        let needing = api.list_needing_collection().unwrap();
        assert_eq!(needing.len(), 1);
        assert_eq!(needing[0].container_id, "CNT-S-001");
    }
}
