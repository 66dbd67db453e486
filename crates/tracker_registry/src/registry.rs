//! Registry: the owning collection of trackers.
//!
//! Ids are stable vector indices; trackers are never removed while the
//! registry lives. Mutation happens only through `&mut self`, so one
//! dispatched request touches a tracker at most once.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    DataPacket, DownloadQuery, HostDriver, HostEvent, PosePacket, RegistryConfig, Request,
    ResponseMessage, ResponseType, TrackerBase, TrackerData, TrackerPose,
};
use tracing::{debug, error, info, instrument, warn};

use crate::deferred::{DeferredQueue, DeferredUpdate};
use crate::error::{RegistryError, Result};
use crate::tracker::DataChange;
use crate::{DeviceAdapter, TrackerEntity};

/// Registry population by lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerCounts {
    pub registered: usize,
    pub added: usize,
    pub activated: usize,
}

pub struct Registry {
    trackers: Vec<TrackerEntity>,
    adapter: DeviceAdapter,
    deferred: DeferredQueue,
    config: RegistryConfig,
}

impl Registry {
    pub fn new(host: Arc<dyn HostDriver>, config: RegistryConfig) -> Self {
        Self {
            trackers: Vec::new(),
            adapter: DeviceAdapter::new(host),
            deferred: DeferredQueue::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn get(&self, id: i32) -> Option<&TrackerEntity> {
        usize::try_from(id).ok().and_then(|i| self.trackers.get(i))
    }

    pub fn trackers(&self) -> &[TrackerEntity] {
        &self.trackers
    }

    pub fn counts(&self) -> TrackerCounts {
        TrackerCounts {
            registered: self.trackers.len(),
            added: self.trackers.iter().filter(|t| t.is_added()).count(),
            activated: self.trackers.iter().filter(|t| t.is_activated()).count(),
        }
    }

    /// Delayed updates not yet applied
    pub fn pending_updates(&self) -> usize {
        self.deferred.pending()
    }

    /// Apply one protocol request and build its response
    ///
    /// Rejections are logged and reported through the result code; they never
    /// propagate as errors.
    #[instrument(
        name = "registry_dispatch",
        skip(self, request),
        fields(kind = request.message_type().as_str())
    )]
    pub async fn dispatch(&mut self, request: &Request) -> ResponseMessage {
        let response = match self.apply(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, code = e.code().as_str(), "request rejected");
                ResponseMessage::failure(e.code())
            }
        };
        self.record_counts();
        response
    }

    async fn apply(&mut self, request: &Request) -> Result<ResponseMessage> {
        match request {
            Request::AddTracker { tracker } => {
                let base = tracker
                    .as_ref()
                    .ok_or_else(|| RegistryError::bad_request("add without a tracker"))?;
                match self.add(base).await {
                    Ok(snapshot) => Ok(ResponseMessage::success(ResponseType::Tracker)
                        .with_id(snapshot.id)
                        .with_tracker(snapshot)),
                    // Registered but not spawned; the caller still learns its id
                    Err(e @ RegistryError::SpawnFailed { .. }) => {
                        let Some(index) = self.find_serial(&base.data.serial) else {
                            return Err(e);
                        };
                        warn!(id = index, error = %e, "tracker registered without a host device");
                        let snapshot = self.trackers[index].snapshot(index as i32);
                        let mut response = ResponseMessage::failure(e.code())
                            .with_id(snapshot.id)
                            .with_tracker(snapshot);
                        response.response_type = ResponseType::Tracker;
                        Ok(response)
                    }
                    Err(e) => Err(e),
                }
            }
            Request::SetTrackerState { id, state } => {
                self.set_state(*id, *state).await?;
                Ok(ResponseMessage::success(ResponseType::Id).with_id(*id))
            }
            Request::SetStateAll { state } => {
                self.set_state_all(*state).await?;
                Ok(ResponseMessage::success(ResponseType::Success))
            }
            Request::UpdateTrackerPose { id, pose } => {
                let packet = pose
                    .as_ref()
                    .ok_or_else(|| RegistryError::bad_request(format!("pose for id {id} is empty")))?;
                self.update_pose(*id, packet)?;
                Ok(ResponseMessage::success(ResponseType::Id).with_id(*id))
            }
            Request::UpdateTrackerData { id, data } => {
                self.update_data(*id, data).await?;
                Ok(ResponseMessage::success(ResponseType::Id).with_id(*id))
            }
            Request::UpdateTrackerVector { trackers } => {
                let bases = trackers
                    .as_deref()
                    .ok_or_else(|| RegistryError::bad_request("tracker vector is empty"))?;
                let last_id = self.update_vector(bases).await?;
                Ok(ResponseMessage::success(ResponseType::Id).with_id(last_id))
            }
            Request::DownloadTracker { query } => {
                let snapshot = self.download(query)?;
                Ok(ResponseMessage::success(ResponseType::Tracker)
                    .with_id(snapshot.id)
                    .with_tracker(snapshot))
            }
            Request::RefreshTracker { id } => {
                self.refresh(*id)?;
                Ok(ResponseMessage::success(ResponseType::Id).with_id(*id))
            }
            Request::RequestRestart { reason } => {
                self.request_restart(reason)?;
                Ok(ResponseMessage::success(ResponseType::Success))
            }
            Request::Ping => Ok(ResponseMessage::success(ResponseType::Success)),
        }
    }

    /// Register a tracker; returns its snapshot with the assigned id
    #[instrument(name = "registry_add", skip(self, base), fields(serial = %base.data.serial))]
    pub async fn add(&mut self, base: &TrackerBase) -> Result<TrackerBase> {
        let serial = &base.data.serial;
        if serial.is_empty() {
            return Err(RegistryError::BadSerial);
        }
        if self.find_serial(serial).is_some() {
            return Err(RegistryError::AlreadyPresent {
                serial: serial.clone(),
            });
        }

        self.trackers.push(TrackerEntity::new(base));
        let index = self.trackers.len() - 1;
        info!(id = index, role = ?base.data.role, "tracker registered");

        if base.data.is_active {
            self.spawn(index).await?;
        }
        Ok(self.trackers[index].snapshot(index as i32))
    }

    /// Set the active flag, announcing the tracker to the host on first activation
    pub async fn set_state(&mut self, id: i32, active: bool) -> Result<()> {
        let index = self.index(id)?;
        self.set_state_at(index, active).await
    }

    /// Apply [`Registry::set_state`] to every tracker
    ///
    /// Keeps going past spawn failures and reports the first one.
    pub async fn set_state_all(&mut self, active: bool) -> Result<()> {
        let mut first_error = None;
        for index in 0..self.trackers.len() {
            if let Err(e) = self.set_state_at(index, active).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Set the pose now, or after the packet's offset
    pub fn update_pose(&mut self, id: i32, packet: &PosePacket) -> Result<()> {
        let index = self.index(id)?;
        match delay_of(packet.millis_from_now)? {
            Some(delay) => {
                self.deferred.schedule(
                    delay,
                    DeferredUpdate::Pose {
                        id: index,
                        pose: packet.pose,
                    },
                );
            }
            None => self.apply_pose(index, packet.pose),
        }
        Ok(())
    }

    /// Apply a data update now, or after the packet's offset
    pub async fn update_data(&mut self, id: i32, packet: &DataPacket) -> Result<()> {
        let index = self.index(id)?;
        match delay_of(packet.millis_from_now)? {
            Some(delay) => {
                self.deferred.schedule(
                    delay,
                    DeferredUpdate::Data {
                        id: index,
                        data: packet.data.clone(),
                    },
                );
                Ok(())
            }
            None => self.apply_data(index, &packet.data).await,
        }
    }

    /// Batch pose/data update; returns the last id that applied
    ///
    /// Bad ids are logged and skipped. Data only applies to trackers the host
    /// has not taken yet.
    pub async fn update_vector(&mut self, bases: &[TrackerBase]) -> Result<i32> {
        let mut last_applied = None;
        for base in bases {
            let index = match self.index(base.id) {
                Ok(index) => index,
                Err(e) => {
                    warn!(error = %e, "tracker vector entry skipped");
                    continue;
                }
            };
            self.apply_pose(index, base.pose);
            if !self.trackers[index].is_added() {
                if let Err(e) = self.apply_data(index, &base.data).await {
                    warn!(id = base.id, error = %e, "tracker vector data not applied");
                }
            }
            last_applied = Some(base.id);
        }
        last_applied.ok_or_else(|| RegistryError::bad_request("no tracker vector entry applied"))
    }

    /// Read-only lookup; serial and role return the first match
    pub fn download(&self, query: &DownloadQuery) -> Result<TrackerBase> {
        let index = match query {
            DownloadQuery::Id(id) => self.index(*id)?,
            DownloadQuery::Serial(serial) => self.find_serial(serial).ok_or_else(|| {
                RegistryError::bad_request(format!("no tracker with serial '{serial}'"))
            })?,
            DownloadQuery::Role(role) => self
                .trackers
                .iter()
                .position(|t| t.role() == *role)
                .ok_or_else(|| RegistryError::bad_request(format!("no tracker with role {role:?}")))?,
        };
        Ok(self.trackers[index].snapshot(index as i32))
    }

    /// Re-push the current pose without touching data
    pub fn refresh(&mut self, id: i32) -> Result<()> {
        let index = self.index(id)?;
        self.adapter.push_pose(&self.trackers[index]);
        Ok(())
    }

    pub fn request_restart(&self, reason: &str) -> Result<()> {
        if reason.is_empty() {
            return Err(RegistryError::bad_request("restart reason is empty"));
        }
        info!(reason, "host restart requested");
        self.adapter.request_restart(reason);
        Ok(())
    }

    /// Apply elapsed delayed updates and pending host callbacks
    ///
    /// Returns how many were applied.
    pub async fn tick(&mut self) -> usize {
        let mut applied = 0;

        for update in self.deferred.drain() {
            match update {
                DeferredUpdate::Pose { id, pose } => self.apply_pose(id, pose),
                DeferredUpdate::Data { id, data } => {
                    if let Err(e) = self.apply_data(id, &data).await {
                        warn!(id, error = %e, "delayed data update failed");
                    }
                }
            }
            applied += 1;
        }

        while let Some(event) = self.adapter.poll_event() {
            self.handle_host_event(event);
            applied += 1;
        }

        if applied > 0 {
            self.record_counts();
        }
        applied
    }

    /// Cancel delayed updates and release every host slot
    pub fn shutdown(&mut self) {
        let cancelled = self.deferred.cancel_all();
        for tracker in &mut self.trackers {
            self.adapter.deactivate(tracker);
        }
        self.record_counts();
        info!(
            trackers = self.trackers.len(),
            cancelled, "registry shut down"
        );
    }

    fn index(&self, id: i32) -> Result<usize> {
        usize::try_from(id)
            .ok()
            .filter(|&i| i < self.trackers.len())
            .ok_or_else(|| RegistryError::unknown_id(id, self.trackers.len()))
    }

    fn find_serial(&self, serial: &str) -> Option<usize> {
        self.trackers.iter().position(|t| t.serial() == serial)
    }

    async fn set_state_at(&mut self, index: usize, active: bool) -> Result<()> {
        if active && !self.trackers[index].is_added() {
            self.spawn(index).await?;
        }
        let tracker = &mut self.trackers[index];
        tracker.set_active(active);
        self.adapter.push_pose(tracker);
        debug!(id = index, active, "tracker state set");
        Ok(())
    }

    /// Announce to the host, retrying a bounded number of times
    async fn spawn(&mut self, index: usize) -> Result<()> {
        if self.trackers[index].is_added() {
            return Ok(());
        }

        let attempts = self.config.spawn_attempts.max(1);
        let delay = Duration::from_millis(self.config.spawn_retry_delay_ms);
        for attempt in 1..=attempts {
            let tracker = &mut self.trackers[index];
            if self.adapter.announce(tracker) {
                tracker.mark_added();
                info!(id = index, serial = %tracker.serial(), attempt, "tracker spawned");
                return Ok(());
            }
            if attempt < attempts {
                warn!(id = index, serial = %tracker.serial(), attempt, "host refused tracker, retrying");
                observability::record_spawn_retry(tracker.serial());
                tokio::time::sleep(delay).await;
            }
        }

        let serial = self.trackers[index].serial().to_string();
        error!(id = index, serial = %serial, attempts, "tracker spawn failed");
        Err(RegistryError::SpawnFailed { serial, attempts })
    }

    fn apply_pose(&mut self, index: usize, pose: TrackerPose) {
        let Some(tracker) = self.trackers.get_mut(index) else {
            return;
        };
        tracker.set_pose(pose);
        self.adapter.push_pose(tracker);
    }

    async fn apply_data(&mut self, index: usize, data: &TrackerData) -> Result<()> {
        if index >= self.trackers.len() {
            return Ok(());
        }
        // Serial clashes only matter while the identity can still change
        if !self.trackers[index].is_added()
            && !data.serial.is_empty()
            && data.serial != self.trackers[index].serial()
            && self.find_serial(&data.serial).is_some()
        {
            return Err(RegistryError::AlreadyPresent {
                serial: data.serial.clone(),
            });
        }

        let change = self.trackers[index].set_data(data);
        if change == DataChange::Identity && self.trackers[index].is_active() {
            self.spawn(index).await?;
        }
        self.adapter.push_pose(&self.trackers[index]);
        Ok(())
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Activate {
                serial,
                object_index,
            } => match self.find_serial(&serial) {
                Some(index) => {
                    let tracker = &mut self.trackers[index];
                    self.adapter.activate(tracker, object_index);
                    self.adapter.push_pose(tracker);
                }
                None => warn!(serial = %serial, object_index, "activation for unknown tracker"),
            },
            HostEvent::Deactivate { serial } => match self.find_serial(&serial) {
                Some(index) => self.adapter.deactivate(&mut self.trackers[index]),
                None => warn!(serial = %serial, "deactivation for unknown tracker"),
            },
        }
    }

    fn record_counts(&self) {
        let counts = self.counts();
        observability::record_tracker_counts(counts.registered, counts.added, counts.activated);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("trackers", &self.trackers)
            .field("pending_updates", &self.deferred.pending())
            .field("config", &self.config)
            .finish()
    }
}

/// `None` applies immediately
fn delay_of(millis_from_now: f64) -> Result<Option<Duration>> {
    if millis_from_now.is_nan() || millis_from_now <= 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(millis_from_now / 1000.0)
        .map(Some)
        .map_err(|_| RegistryError::bad_request(format!("invalid offset {millis_from_now} ms")))
}
