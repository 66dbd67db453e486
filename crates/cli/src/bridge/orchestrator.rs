//! Bridge orchestrator - wires the driver side and the application side together.
//!
//! Driver side: mock host runtime, registry and supervised service loop.
//! Application side: synthetic skeleton, per-tracker filters and calibration,
//! and a client pushing one tracker vector per skeleton frame.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use calibration::{CalibrationOffsets, CalibrationTransform};
use contracts::{
    BridgeConfig, DeviceReading, DeviceSource, Joint, TrackerBase, TrackerData, TrackerPose,
    TrackerRole,
};
use ipc::{BridgeClient, MemoryTransport, ServerHandle, ServiceLoop};
use pose_filters::TrackerFilters;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use tracker_registry::{MockHost, Registry};

use super::source::{tracked_joint, SyntheticSkeleton};
use super::RunStats;

/// Trackers registered when nothing else is requested
pub const DEFAULT_ROLES: [TrackerRole; 3] =
    [TrackerRole::Waist, TrackerRole::LeftFoot, TrackerRole::RightFoot];

/// Bridge run settings
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub config: BridgeConfig,

    /// Roles to register, each driven by its skeleton joint
    pub roles: Vec<TrackerRole>,

    /// Skeleton update rate (Hz)
    pub source_rate_hz: f64,

    /// Stop after this many frames (None = unlimited)
    pub max_frames: Option<u64>,

    /// Stop after this long (None = no timeout)
    pub timeout: Option<Duration>,
}

impl BridgeSettings {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            roles: DEFAULT_ROLES.to_vec(),
            source_rate_hz: 60.0,
            max_frames: None,
            timeout: None,
        }
    }
}

/// One registered tracker on the application side
struct TrackerSlot {
    id: i32,
    data: TrackerData,
    joint: Joint,
    filters: TrackerFilters,
}

/// In-process bridge
pub struct Bridge {
    settings: BridgeSettings,
    host: Arc<MockHost>,
}

impl Bridge {
    pub fn new(settings: BridgeSettings) -> Self {
        Self {
            settings,
            host: Arc::new(MockHost::new()),
        }
    }

    /// Run until the frame limit, the timeout, or `stop` resolves
    #[instrument(name = "bridge_run", skip_all, fields(roles = self.settings.roles.len()))]
    pub async fn run(self, stop: impl Future<Output = ()>) -> Result<RunStats> {
        let start_time = Instant::now();
        let config = &self.settings.config;

        let registry = Registry::new(self.host.clone(), config.registry.clone());
        let (server_end, client_end) = MemoryTransport::pair(&config.ipc);
        let server = ServerHandle::spawn(ServiceLoop::new(server_end, registry, config.ipc.clone()));
        let client = BridgeClient::new(client_end, &config.ipc);
        info!(
            rate_hz = config.ipc.loop_rate_hz,
            buffer_size = config.ipc.buffer_size,
            "Service loop started"
        );

        let mut stats = RunStats::default();
        let outcome = match self.register(&client).await {
            Ok(mut slots) => {
                stats.trackers = slots.len();
                let push = self.push_frames(&client, &server, &mut slots, &mut stats);
                let limited = async {
                    match self.settings.timeout {
                        Some(timeout) => match tokio::time::timeout(timeout, push).await {
                            Ok(result) => result,
                            Err(_) => {
                                warn!(timeout_secs = timeout.as_secs(), "Bridge run timed out");
                                Ok(())
                            }
                        },
                        None => push.await,
                    }
                };
                tokio::select! {
                    result = limited => result,
                    _ = stop => {
                        warn!("Received shutdown signal, stopping bridge...");
                        Ok(())
                    }
                }
            }
            Err(e) => Err(e),
        };

        info!("Shutting down bridge...");
        stats.server_exit = Some(server.shutdown().await);
        stats.host_poses = self.host.pose_count();
        stats.duration = start_time.elapsed();

        info!(
            frames = stats.frames_pushed,
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Bridge shutdown complete"
        );

        outcome.map(|()| stats)
    }

    /// Add one tracker per configured role
    async fn register(&self, client: &BridgeClient<MemoryTransport>) -> Result<Vec<TrackerSlot>> {
        let mut slots = Vec::with_capacity(self.settings.roles.len());

        for role in &self.settings.roles {
            let Some(joint) = tracked_joint(*role) else {
                warn!(role = ?role, "No skeleton joint drives this role, skipped");
                continue;
            };

            let data = TrackerData::new(role.default_serial(), *role, true);
            let response = client
                .add_tracker(TrackerBase::new(data.clone()))
                .await
                .with_context(|| format!("Failed to add tracker {}", data.serial))?;
            if !response.success {
                anyhow::bail!(
                    "Tracker {} rejected: {}",
                    data.serial,
                    response.result.as_str()
                );
            }

            info!(id = response.id, serial = %data.serial, role = ?role, "Tracker added");
            slots.push(TrackerSlot {
                id: response.id,
                data,
                joint,
                filters: TrackerFilters::new(&self.settings.config.filters),
            });
        }

        Ok(slots)
    }

    async fn push_frames(
        &self,
        client: &BridgeClient<MemoryTransport>,
        server: &ServerHandle,
        slots: &mut [TrackerSlot],
        stats: &mut RunStats,
    ) -> Result<()> {
        let calibration = &self.settings.config.calibration;
        let transform = CalibrationTransform::from_stored(&calibration.stored);
        let offsets = CalibrationOffsets {
            position: calibration.position_offset,
            orientation: calibration.orientation_offset,
        };
        if !transform.calibrated {
            warn!("No stored calibration, poses are sent in device space");
        }

        let mut source = SyntheticSkeleton::new(self.settings.source_rate_hz);
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(1.0 / self.settings.source_rate_hz.max(1.0)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            device = source.name(),
            max_frames = ?self.settings.max_frames,
            "Pushing skeleton frames"
        );

        loop {
            interval.tick().await;
            source.update();
            if !source.status().is_ok() {
                warn!(status = %source.status().text(), "Device not ready");
                continue;
            }

            let trackers = match source.reading() {
                DeviceReading::Skeleton(frame) => slots
                    .iter_mut()
                    .map(|slot| {
                        let raw = TrackerPose::new(
                            frame.position(slot.joint),
                            frame.orientation(slot.joint),
                        );
                        let filtered = slot.filters.update(&raw);
                        let mut base = TrackerBase::new(slot.data.clone());
                        base.id = slot.id;
                        base.pose = transform.apply(&filtered, &offsets);
                        base
                    })
                    .collect::<Vec<_>>(),
                DeviceReading::Joints(_) => continue,
            };

            let sent = Instant::now();
            match client.update_tracker_vector(trackers).await {
                Ok(response) => {
                    stats
                        .transactions
                        .push(response.result, sent.elapsed().as_secs_f64() * 1e6);
                    stats.frames_pushed += 1;
                    if stats.frames_pushed % 100 == 0 {
                        debug!(frames = stats.frames_pushed, "Bridge progress");
                    }
                }
                Err(e) => {
                    stats.transport_failures += 1;
                    warn!(error = %e, "Tracker vector update failed");
                    if server.is_finished() {
                        anyhow::bail!("Service loop stopped: {e}");
                    }
                }
            }

            if let Some(max) = self.settings.max_frames {
                if stats.frames_pushed >= max {
                    info!(frames = stats.frames_pushed, "Reached max frames limit");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bridge_pushes_frames_to_host() {
        let mut settings = BridgeSettings::new(BridgeConfig::default());
        settings.source_rate_hz = 200.0;
        settings.max_frames = Some(20);

        let bridge = Bridge::new(settings);
        let host = Arc::clone(&bridge.host);
        let stats = bridge.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.trackers, 3);
        assert_eq!(stats.frames_pushed, 20);
        assert_eq!(stats.transport_failures, 0);
        assert_eq!(stats.transactions.total(), 20);
        assert_eq!(stats.server_exit, Some(ipc::ServerExit::Shutdown));

        let serials: Vec<_> = host.added().into_iter().map(|(serial, _)| serial).collect();
        assert_eq!(serials, vec!["AME-WAIST", "AME-LFOOT", "AME-RFOOT"]);
        assert!(stats.host_poses > 0);
    }

    #[tokio::test]
    async fn test_stop_signal_ends_run() {
        let mut settings = BridgeSettings::new(BridgeConfig::default());
        settings.roles = vec![TrackerRole::Waist];

        let stop = tokio::time::sleep(Duration::from_millis(100));
        let stats = Bridge::new(settings).run(stop).await.unwrap();
        assert_eq!(stats.trackers, 1);
        assert_eq!(stats.server_exit, Some(ipc::ServerExit::Shutdown));
    }

    #[tokio::test]
    async fn test_roles_without_joint_are_skipped() {
        let mut settings = BridgeSettings::new(BridgeConfig::default());
        settings.roles = vec![TrackerRole::Keyboard, TrackerRole::Chest];
        settings.max_frames = Some(1);

        let stats = Bridge::new(settings).run(std::future::pending()).await.unwrap();
        assert_eq!(stats.trackers, 1);
    }
}
