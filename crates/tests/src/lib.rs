//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Responsibilities:
//! - Contract snapshot tests
//! - In-process e2e tests (no host runtime needed)
//! - Config → filters → calibration → registry → IPC flows

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BridgeConfig, ConfigVersion, OrientationFilterKind, PositionFilterKind};

    #[test]
    fn test_default_config_is_valid() {
        let config = BridgeConfig::default();
        assert_eq!(config.version, ConfigVersion::V1);
        ConfigLoader::validate(&config).unwrap();
    }

    #[test]
    fn test_default_config_survives_toml() {
        let text = ConfigLoader::to_toml(&BridgeConfig::default()).unwrap();
        let loaded = ConfigLoader::load_from_str(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(loaded.ipc.request_pipe, BridgeConfig::default().ipc.request_pipe);
        assert_eq!(loaded.filters.position, PositionFilterKind::Lerp);
        assert_eq!(loaded.filters.orientation, OrientationFilterKind::Slerp);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use calibration::{
        AutoCalibration, CalibrationOffsets, CalibrationStore, CalibrationTransform, MemoryStore,
    };
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        BridgeConfig, FilterConfig, OrientationFilterKind, Position, PositionFilterKind, ResultCode,
        TrackerBase, TrackerData, TrackerPose, TrackerRole,
    };
    use ipc::{BridgeClient, MemoryTransport, ServerExit, ServerHandle, ServiceLoop};
    use nalgebra::{Rotation3, Vector3};
    use observability::TransactionStats;
    use pose_filters::TrackerFilters;
    use tracker_registry::{MockHost, MockHostConfig, Registry};

    struct Harness {
        client: BridgeClient<MemoryTransport>,
        host: Arc<MockHost>,
        server: ServerHandle,
    }

    fn harness(config: &BridgeConfig, host: MockHost) -> Harness {
        let host = Arc::new(host);
        let registry = Registry::new(Arc::clone(&host) as _, config.registry.clone());
        let (server_end, client_end) = MemoryTransport::pair(&config.ipc);
        let server = ServerHandle::spawn(ServiceLoop::new(server_end, registry, config.ipc.clone()));
        Harness {
            client: BridgeClient::new(client_end, &config.ipc),
            host,
            server,
        }
    }

    fn tracker(role: TrackerRole, active: bool) -> TrackerBase {
        TrackerBase::new(TrackerData::new(role.default_serial(), role, active))
    }

    /// Register → activate → stream poses → deactivate all
    #[tokio::test]
    async fn test_e2e_tracker_lifecycle() {
        let h = harness(&BridgeConfig::default(), MockHost::new());

        for role in [TrackerRole::Waist, TrackerRole::LeftFoot, TrackerRole::RightFoot] {
            let response = h.client.add_tracker(tracker(role, false)).await.unwrap();
            assert_eq!(response.result, ResultCode::Ok);
        }
        assert!(h.host.added().is_empty(), "inactive trackers must not reach the host");

        let response = h.client.set_state_all(true).await.unwrap();
        assert_eq!(response.result, ResultCode::Ok);
        assert_eq!(h.host.added().len(), 3);

        // Activation callbacks are applied on the next loop tick
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut stats = TransactionStats::new();
        for frame in 0..10 {
            let y = 1.0 + frame as f64 * 0.01;
            let batch = (0..3)
                .map(|id| {
                    let mut base = tracker(TrackerRole::Waist, true);
                    base.id = id;
                    base.pose.position = Position::new(id as f64, y, 0.0);
                    base
                })
                .collect();
            let response = h.client.update_tracker_vector(batch).await.unwrap();
            stats.push(response.result, 0.0);
            assert_eq!(response.id, 2);
        }
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.summary().failures, 0);

        // Every entry carried waist data; the host already owns these devices
        let by_role = h
            .client
            .download_tracker_by_role(TrackerRole::LeftFoot)
            .await
            .unwrap();
        assert_eq!(by_role.id, 1);
        assert_eq!(by_role.tracker.unwrap().data.serial, "AME-LFOOT");

        // Activation pushed one pose before the stream
        let poses = h.host.poses_for(2);
        assert_eq!(poses.len(), 11);
        let last = poses.last().unwrap();
        assert!((last.position.y - 1.09).abs() < 1e-9, "got {}", last.position.y);

        assert_eq!(h.server.shutdown().await, ServerExit::Shutdown);
    }

    /// Solved automatic calibration applied to poses on their way to the host
    #[tokio::test]
    async fn test_e2e_calibrated_pose_reaches_host() {
        let yaw = std::f64::consts::FRAC_PI_2;
        let offset = Vector3::new(1.0, 0.0, -0.5);
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw);
        let to_headset = |p: &Position| {
            let v = rotation * Vector3::new(p.x, p.y, p.z) + offset;
            Position::new(v.x, v.y, v.z)
        };

        let mut store = MemoryStore::default();
        let mut auto = AutoCalibration::new(3);
        for point in [
            Position::new(0.0, 1.7, 2.0),
            Position::new(0.8, 1.6, 2.4),
            Position::new(-0.4, 1.5, 1.8),
        ] {
            auto.capture(&point, &to_headset(&point)).unwrap();
        }
        let outcome = auto.solve(&mut store).unwrap();
        assert!(outcome.rms_error < 1e-9, "got {}", outcome.rms_error);

        let mut config = BridgeConfig::default();
        config.calibration.stored = store.load().unwrap();
        config.filters = FilterConfig {
            position: PositionFilterKind::Off,
            orientation: OrientationFilterKind::Off,
            ..FilterConfig::default()
        };
        ConfigLoader::validate(&config).unwrap();

        let h = harness(&config, MockHost::new());
        let added = h.client.add_tracker(tracker(TrackerRole::Waist, true)).await.unwrap();
        assert!(added.success);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut filters = TrackerFilters::new(&config.filters);
        let transform = CalibrationTransform::from_stored(&config.calibration.stored);
        let device = Position::new(0.3, 1.0, 2.2);
        let raw = TrackerPose::new(device, Default::default());
        let pose = transform.apply(&filters.update(&raw), &CalibrationOffsets::default());

        let response = h.client.update_tracker_pose(added.id, pose, 0.0).await.unwrap();
        assert_eq!(response.result, ResultCode::Ok);

        let (index, driver_pose) = h.host.last_pose().unwrap();
        assert_eq!(index, 1);
        let expected = to_headset(&device);
        for (got, want) in [
            (driver_pose.position.x, expected.x),
            (driver_pose.position.y, expected.y),
            (driver_pose.position.z, expected.z),
        ] {
            assert!((got - want).abs() < 1e-6, "Expected ~{}, got {}", want, got);
        }

        h.server.shutdown().await;
    }

    /// Delayed pose updates land after their offset, applied by the loop tick
    #[tokio::test]
    async fn test_e2e_delayed_pose() {
        let h = harness(&BridgeConfig::default(), MockHost::new());
        let added = h.client.add_tracker(tracker(TrackerRole::Chest, true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let before = h.host.pose_count();

        let pose = TrackerPose::new(Position::new(0.0, 1.4, 0.0), Default::default());
        let response = h.client.update_tracker_pose(added.id, pose, 40.0).await.unwrap();
        assert_eq!(response.result, ResultCode::Ok);
        assert_eq!(h.host.pose_count(), before);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let downloaded = h.client.download_tracker_by_id(added.id).await.unwrap();
        let snapshot = downloaded.tracker.unwrap();
        assert!((snapshot.pose.position.y - 1.4).abs() < 1e-9);
        assert!(h.host.pose_count() > before);

        h.server.shutdown().await;
    }

    /// Host refusals surface as spawn failures after the configured retries
    #[tokio::test]
    async fn test_e2e_host_refusal() {
        let text = r#"
[registry]
spawn_attempts = 2
spawn_retry_delay_ms = 1
"#;
        let config = ConfigLoader::load_from_str(text, ConfigFormat::Toml).unwrap();
        let host = MockHost::with_config(MockHostConfig {
            refuse_serials: vec!["AME-WAIST".into()],
            ..MockHostConfig::default()
        });
        let h = harness(&config, host);

        let refused = h.client.add_tracker(tracker(TrackerRole::Waist, true)).await.unwrap();
        assert_eq!(refused.result, ResultCode::SpawnFailed);
        assert!(!refused.success);
        assert_eq!(refused.id, 0);
        assert_eq!(refused.tracker.unwrap().data.serial, "AME-WAIST");
        assert_eq!(h.host.attempt_count(), 2);

        // The loop keeps serving other trackers
        let accepted = h.client.add_tracker(tracker(TrackerRole::LeftFoot, true)).await.unwrap();
        assert_eq!(accepted.result, ResultCode::Ok);

        h.server.shutdown().await;
    }

    /// Two clients sharing one transport take turns on the request pipe
    #[tokio::test]
    async fn test_e2e_clients_take_turns() {
        let config = BridgeConfig::default();
        let h = harness(&config, MockHost::new());
        let second = BridgeClient::new(h.client.transport().clone(), &config.ipc);
        let first = &h.client;

        let (a, b) = tokio::join!(
            async {
                let mut results = Vec::new();
                for _ in 0..5 {
                    results.push(first.test_connection().await.unwrap().response.result);
                }
                results
            },
            async {
                let mut results = Vec::new();
                for _ in 0..5 {
                    results.push(second.test_connection().await.unwrap().response.result);
                }
                results
            }
        );
        assert!(a.iter().chain(&b).all(|r| *r == ResultCode::Ok));

        h.server.shutdown().await;
    }
}
