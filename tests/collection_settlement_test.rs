// ==========================================
// 收运结算集成测试
// ==========================================
// 测试目标: 登记校验 / 状态流转 / 进入 completed 只扣一次
// ==========================================


#[cfg(test)]
mod collection_settlement_test {
    use bombona_monitor::api::ApiError;
    use bombona_monitor::domain::types::{CollectionStatus, ContainerStatus, SettlementState};
    use bombona_monitor::domain::NewCollection;

    use crate::test_helpers::{seed_container, set_container_weight, setup_env};

    const DESTINATION: &str = "Incineradora Regional";

    #[test]
    fn test_create_collection_validation() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-001", 200.0, 50.0);
        let api = &env.state.collection_api;

        assert!(matches!(
            api.create_collection(NewCollection::pending("CNT-C-001", 60.0, DESTINATION)),
            Err(ApiError::InvariantViolation(_))
        ));
        assert!(matches!(
            api.create_collection(NewCollection::pending("CNT-C-001", 0.0, DESTINATION)),
            Err(ApiError::InvariantViolation(_))
        ));
        assert!(matches!(
            api.create_collection(NewCollection::pending("CNT-C-001", -3.0, DESTINATION)),
            Err(ApiError::InvariantViolation(_))
        ));
        assert!(matches!(
            api.create_collection(NewCollection::pending("CNT-NOPE", 1.0, DESTINATION)),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            api.create_collection(NewCollection::pending("CNT-C-001", 1.0, "  ")),
            Err(ApiError::InvalidInput(_))
        ));

        let created = api
            .create_collection(NewCollection::pending("CNT-C-001", 50.0, DESTINATION))
            .unwrap();
        assert_eq!(created.status, CollectionStatus::Pending);
        assert_eq!(created.settlement_state, SettlementState::Pending);
        assert_eq!(api.list_collections("CNT-C-001").unwrap().len(), 1);
    }

    #[test]
    fn test_completion_deducts_exactly_once() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-002", 200.0, 195.0);
        let api = &env.state.collection_api;
        let monitor = &env.state.monitor_api;

        let collection = api
            .create_collection(NewCollection::pending("CNT-C-002", 120.0, DESTINATION))
            .unwrap();
        // 登记本身不扣重
        assert_eq!(monitor.get_container("CNT-C-002").unwrap().current_weight_kg, 195.0);

        let in_progress = api
            .transition_collection(&collection.collection_id, CollectionStatus::InProgress)
            .unwrap();
        assert_eq!(in_progress.status, CollectionStatus::InProgress);
        assert_eq!(monitor.get_container("CNT-C-002").unwrap().current_weight_kg, 195.0);

        let completed = api
            .transition_collection(&collection.collection_id, CollectionStatus::Completed)
            .unwrap();
        assert_eq!(completed.status, CollectionStatus::Completed);
        assert_eq!(completed.settlement_state, SettlementState::Applied);
        assert!(completed.settled_at.is_some());

        let container = monitor.get_container("CNT-C-002").unwrap();
        assert_eq!(container.current_weight_kg, 75.0);
        assert_eq!(container.status, ContainerStatus::Normal);

        // 重复进入 completed / 重复结算: 不再扣重
        api.transition_collection(&collection.collection_id, CollectionStatus::Completed)
            .unwrap();
        let container = api.settle_collection(&collection.collection_id).unwrap();
        assert_eq!(container.current_weight_kg, 75.0);
        assert_eq!(monitor.get_container("CNT-C-002").unwrap().current_weight_kg, 75.0);
    }

    #[test]
    fn test_settle_requires_completed() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-003", 200.0, 100.0);
        let api = &env.state.collection_api;

        let collection = api
            .create_collection(NewCollection::pending("CNT-C-003", 40.0, DESTINATION))
            .unwrap();

        assert!(matches!(
            api.settle_collection(&collection.collection_id),
            Err(ApiError::InvalidTransition { .. })
        ));
        assert!(matches!(
            api.settle_collection("no-such-collection"),
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(
            env.state.monitor_api.get_container("CNT-C-003").unwrap().current_weight_kg,
            100.0
        );
    }

    #[test]
    fn test_created_completed_is_waived() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-004", 200.0, 100.0);
        let api = &env.state.collection_api;

        let mut request = NewCollection::pending("CNT-C-004", 40.0, DESTINATION);
        request.status = CollectionStatus::Completed;
        request.manifest_number = Some("MTR-2024-0001".to_string());

        let collection = api.create_collection(request).unwrap();
        assert_eq!(collection.settlement_state, SettlementState::Waived);
        assert!(!collection.awaiting_settlement());

        let container = api.settle_collection(&collection.collection_id).unwrap();
        assert_eq!(container.current_weight_kg, 100.0);
    }

    #[test]
    fn test_terminal_states_cannot_be_left() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-005", 200.0, 100.0);
        let api = &env.state.collection_api;

        let cancelled = api
            .create_collection(NewCollection::pending("CNT-C-005", 10.0, DESTINATION))
            .unwrap();
        api.transition_collection(&cancelled.collection_id, CollectionStatus::Cancelled)
            .unwrap();
        assert!(matches!(
            api.transition_collection(&cancelled.collection_id, CollectionStatus::Completed),
            Err(ApiError::InvalidTransition { .. })
        ));

        let done = api
            .create_collection(NewCollection::pending("CNT-C-005", 10.0, DESTINATION))
            .unwrap();
        api.transition_collection(&done.collection_id, CollectionStatus::Completed)
            .unwrap();
        assert!(matches!(
            api.transition_collection(&done.collection_id, CollectionStatus::Pending),
            Err(ApiError::InvalidTransition { .. })
        ));

        // 只有 done 扣了 10kg
        assert_eq!(
            env.state.monitor_api.get_container("CNT-C-005").unwrap().current_weight_kg,
            90.0
        );
    }

    #[test]
    fn test_completion_revalidates_against_current_weight() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-006", 200.0, 100.0);
        let api = &env.state.collection_api;

        let collection = api
            .create_collection(NewCollection::pending("CNT-C-006", 80.0, DESTINATION))
            .unwrap();

        // 登记后容器被部分清空
        set_container_weight(&env.state, "CNT-C-006", 30.0);

        assert!(matches!(
            api.transition_collection(&collection.collection_id, CollectionStatus::Completed),
            Err(ApiError::InvariantViolation(_))
        ));

        // 事务回滚: 状态与结算均未改变
        let unchanged = api.get_collection(&collection.collection_id).unwrap();
        assert_eq!(unchanged.status, CollectionStatus::Pending);
        assert_eq!(unchanged.settlement_state, SettlementState::Pending);
        assert_eq!(
            env.state.monitor_api.get_container("CNT-C-006").unwrap().current_weight_kg,
            30.0
        );
    }

    #[test]
    fn test_settlement_keeps_alerts_and_temperature() {
        let env = setup_env();
        seed_container(&env.state, "CNT-C-007", 200.0, 150.0);
        let monitor = &env.state.monitor_api;
        let api = &env.state.collection_api;

        monitor.apply_reading("CNT-C-007", 10.0, 42.0).unwrap();

        let collection = api
            .create_collection(NewCollection::pending("CNT-C-007", 100.0, DESTINATION))
            .unwrap();
        api.transition_collection(&collection.collection_id, CollectionStatus::Completed)
            .unwrap();

        let container = monitor.get_container("CNT-C-007").unwrap();
        assert_eq!(container.current_weight_kg, 60.0);
        assert_eq!(container.temperature_c, 42.0);
        assert_eq!(container.status, ContainerStatus::Normal);
        assert_eq!(monitor.list_open_alerts("CNT-C-007").unwrap().len(), 2);
    }
}
