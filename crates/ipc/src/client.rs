//! Application-side client.
//!
//! One transaction at a time: take the to-server semaphore, write the request,
//! signal start, then (if a reply is wanted) wait for the from-server signal and
//! read the reply. Requests sent without a reply are released by the server once
//! it has read them.

use std::time::Duration;

use bytes::Bytes;
use contracts::{
    timestamp_now_us, Channel, DataPacket, DownloadQuery, IpcConfig, PosePacket, Request,
    RequestMessage, ResponseMessage, Semaphore, TrackerBase, TrackerData, TrackerPose,
    TrackerRole, Transport,
};
use tracing::{debug, instrument, warn};

use crate::codec::{decode_response, encode_request};
use crate::{IpcError, Result};

/// Outcome of [`BridgeClient::test_connection`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTest {
    pub response: ResponseMessage,
    /// When the ping was composed (µs since epoch)
    pub send_time_us: i64,
    /// Round trip, never negative
    pub elapsed_us: i64,
}

/// Client for the tracker bridge
#[derive(Debug)]
pub struct BridgeClient<T> {
    transport: T,
    reply_timeout: Duration,
}

impl<T: Transport + Sync> BridgeClient<T> {
    pub fn new(transport: T, config: &IpcConfig) -> Self {
        Self {
            transport,
            reply_timeout: Duration::from_millis(config.reply_timeout_ms),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one transaction
    ///
    /// Returns `None` when the message does not want a reply. A zero
    /// `timestamp_us` is stamped with the current time.
    ///
    /// On a reply timeout the to-server semaphore stays taken until the server's
    /// start timeout hands it back.
    #[instrument(
        name = "bridge_client_send",
        skip(self, message),
        fields(kind = message.message_type().as_str(), want_reply = message.want_reply)
    )]
    pub async fn send(&self, mut message: RequestMessage) -> Result<Option<ResponseMessage>> {
        if message.timestamp_us == 0 {
            message.timestamp_us = timestamp_now_us();
        }
        let frame = encode_request(&message)?;

        if !self.transport.acquire(Semaphore::ToServer, None).await {
            return Err(IpcError::Stopped {
                message: "to-server semaphore closed".into(),
            });
        }
        // Left over from a reply nobody read
        self.transport
            .acquire(Semaphore::FromServer, Some(Duration::ZERO))
            .await;

        if let Err(e) = self.write_request(&frame).await {
            self.transport.release(Semaphore::ToServer);
            return Err(e);
        }
        if !message.want_reply {
            return Ok(None);
        }

        if !self
            .transport
            .acquire(Semaphore::FromServer, Some(self.reply_timeout))
            .await
        {
            let timeout_ms = self.reply_timeout.as_millis() as u64;
            warn!(timeout_ms, "No reply from server");
            return Err(IpcError::ReplyTimeout { timeout_ms });
        }

        let reply = self.read_reply().await;
        self.transport.release(Semaphore::ToServer);
        let response = decode_response(&reply?)?;
        debug!(result = response.result.as_str(), id = response.id, "Reply received");
        Ok(Some(response))
    }

    /// Send a request and wait for its reply
    pub async fn call(&self, request: Request) -> Result<ResponseMessage> {
        match self.send(RequestMessage::new(request)).await? {
            Some(response) => Ok(response),
            None => Err(IpcError::Stopped {
                message: "reply missing".into(),
            }),
        }
    }

    /// Send a request without waiting for a reply
    pub async fn notify(&self, request: Request) -> Result<()> {
        self.send(RequestMessage::new(request).with_reply(false))
            .await
            .map(|_| ())
    }

    pub async fn add_tracker(&self, tracker: TrackerBase) -> Result<ResponseMessage> {
        self.call(Request::AddTracker {
            tracker: Some(tracker),
        })
        .await
    }

    pub async fn set_tracker_state(&self, id: i32, state: bool) -> Result<ResponseMessage> {
        self.call(Request::SetTrackerState { id, state }).await
    }

    pub async fn set_state_all(&self, state: bool) -> Result<ResponseMessage> {
        self.call(Request::SetStateAll { state }).await
    }

    /// Update a pose, applied `millis_from_now` ms after the server reads it
    pub async fn update_tracker_pose(
        &self,
        id: i32,
        pose: TrackerPose,
        millis_from_now: f64,
    ) -> Result<ResponseMessage> {
        self.call(Request::UpdateTrackerPose {
            id,
            pose: Some(PosePacket {
                pose,
                millis_from_now,
            }),
        })
        .await
    }

    pub async fn update_tracker_data(
        &self,
        id: i32,
        data: TrackerData,
        millis_from_now: f64,
    ) -> Result<ResponseMessage> {
        self.call(Request::UpdateTrackerData {
            id,
            data: DataPacket {
                data,
                millis_from_now,
            },
        })
        .await
    }

    /// Apply pose and data for several trackers at once
    pub async fn update_tracker_vector(
        &self,
        trackers: Vec<TrackerBase>,
    ) -> Result<ResponseMessage> {
        self.call(Request::UpdateTrackerVector {
            trackers: Some(trackers),
        })
        .await
    }

    pub async fn download_tracker_by_id(&self, id: i32) -> Result<ResponseMessage> {
        self.download(DownloadQuery::Id(id)).await
    }

    pub async fn download_tracker_by_serial(&self, serial: &str) -> Result<ResponseMessage> {
        self.download(DownloadQuery::Serial(serial.to_string())).await
    }

    pub async fn download_tracker_by_role(&self, role: TrackerRole) -> Result<ResponseMessage> {
        self.download(DownloadQuery::Role(role)).await
    }

    pub async fn refresh_tracker(&self, id: i32) -> Result<ResponseMessage> {
        self.call(Request::RefreshTracker { id }).await
    }

    pub async fn request_vr_restart(&self, reason: &str) -> Result<ResponseMessage> {
        self.call(Request::RequestRestart {
            reason: reason.to_string(),
        })
        .await
    }

    /// Ping the server and measure the round trip
    pub async fn test_connection(&self) -> Result<ConnectionTest> {
        let send_time_us = timestamp_now_us();
        let mut message = RequestMessage::new(Request::Ping);
        message.timestamp_us = send_time_us;

        let response = match self.send(message).await? {
            Some(response) => response,
            None => {
                return Err(IpcError::Stopped {
                    message: "reply missing".into(),
                })
            }
        };
        let elapsed_us = (timestamp_now_us() - send_time_us).max(0);
        Ok(ConnectionTest {
            response,
            send_time_us,
            elapsed_us,
        })
    }

    async fn download(&self, query: DownloadQuery) -> Result<ResponseMessage> {
        self.call(Request::DownloadTracker { query }).await
    }

    async fn write_request(&self, frame: &[u8]) -> Result<()> {
        self.transport.open(Channel::Request).await?;
        self.transport.release(Semaphore::Start);
        let written = self.transport.write(Channel::Request, frame).await;
        self.transport.close(Channel::Request).await?;
        written.map_err(IpcError::from)
    }

    async fn read_reply(&self) -> Result<Bytes> {
        self.transport.open(Channel::Reply).await?;
        let frame = tokio::time::timeout(self.reply_timeout, self.transport.read(Channel::Reply))
            .await
            .map_err(|_| IpcError::ReplyTimeout {
                timeout_ms: self.reply_timeout.as_millis() as u64,
            })?;
        self.transport.close(Channel::Reply).await?;
        Ok(frame?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use contracts::{Orientation, Position, RegistryConfig, ResponseType, ResultCode};
    use tracker_registry::{MockHost, Registry};

    use crate::{MemoryTransport, ServerExit, ServerHandle, ServiceLoop};

    struct Bridge {
        client: BridgeClient<MemoryTransport>,
        host: Arc<MockHost>,
        server: ServerHandle,
    }

    fn bridge(config: IpcConfig) -> Bridge {
        let (server_end, client_end) = MemoryTransport::pair(&config);
        let host = Arc::new(MockHost::new());
        let registry = Registry::new(Arc::clone(&host) as _, RegistryConfig::default());
        let server = ServerHandle::spawn(ServiceLoop::new(server_end, registry, config.clone()));
        Bridge {
            client: BridgeClient::new(client_end, &config),
            host,
            server,
        }
    }

    fn waist(serial: &str) -> TrackerBase {
        TrackerBase::new(TrackerData::new(serial, TrackerRole::Waist, true))
    }

    #[tokio::test]
    async fn test_add_then_download() {
        let bridge = bridge(IpcConfig::default());

        let added = bridge.client.add_tracker(waist("AME-WAIST")).await.unwrap();
        assert_eq!(added.result, ResultCode::Ok);
        assert_eq!(added.response_type, ResponseType::Tracker);
        assert_eq!(added.id, 0);
        assert!(added.timestamp_us >= added.manual_timestamp_us);

        let by_serial = bridge
            .client
            .download_tracker_by_serial("AME-WAIST")
            .await
            .unwrap();
        assert!(by_serial.success);
        let snapshot = by_serial.tracker.unwrap();
        assert_eq!(snapshot.id, 0);
        assert_eq!(snapshot.data.role, TrackerRole::Waist);

        let by_role = bridge
            .client
            .download_tracker_by_role(TrackerRole::LeftFoot)
            .await
            .unwrap();
        assert_eq!(by_role.result, ResultCode::BadRequest);

        assert_eq!(bridge.host.added().len(), 1);
        assert_eq!(bridge.server.shutdown().await, ServerExit::Shutdown);
    }

    #[tokio::test]
    async fn test_duplicate_and_empty_serials() {
        let bridge = bridge(IpcConfig::default());

        bridge.client.add_tracker(waist("S1")).await.unwrap();
        let duplicate = bridge.client.add_tracker(waist("S1")).await.unwrap();
        assert_eq!(duplicate.result, ResultCode::AlreadyPresent);

        let empty = bridge.client.add_tracker(waist("")).await.unwrap();
        assert_eq!(empty.result, ResultCode::BadSerial);

        bridge.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_pose_reaches_activated_device() {
        let bridge = bridge(IpcConfig::default());
        bridge.client.add_tracker(waist("S1")).await.unwrap();

        // Activation is applied on the next loop tick
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(bridge.host.properties(1).is_some());

        let pose = TrackerPose::new(Position::new(0.0, 1.0, 0.5), Orientation::IDENTITY);
        let response = bridge
            .client
            .update_tracker_pose(0, pose, 0.0)
            .await
            .unwrap();
        assert_eq!(response.result, ResultCode::Ok);

        let (index, driver_pose) = bridge.host.last_pose().unwrap();
        assert_eq!(index, 1);
        assert!(driver_pose.pose_is_valid);
        assert!((driver_pose.position.y - 1.0).abs() < 1e-9);

        bridge.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_notify_is_applied_without_reply() {
        let bridge = bridge(IpcConfig::default());
        bridge.client.add_tracker(waist("S1")).await.unwrap();

        bridge
            .client
            .notify(Request::SetTrackerState { id: 0, state: false })
            .await
            .unwrap();

        let response = bridge.client.download_tracker_by_id(0).await.unwrap();
        assert!(!response.tracker.unwrap().data.is_active);

        bridge.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_connection_round_trip() {
        let bridge = bridge(IpcConfig::default());

        let test = bridge.client.test_connection().await.unwrap();
        assert!(test.response.success);
        assert_eq!(test.response.response_type, ResponseType::Success);
        assert!(test.elapsed_us >= 0);
        assert!(test.send_time_us > 0);

        bridge.server.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_timeout_without_server() {
        let config = IpcConfig {
            reply_timeout_ms: 50,
            ..IpcConfig::default()
        };
        let (_server_end, client_end) = MemoryTransport::pair(&config);
        let client = BridgeClient::new(client_end, &config);

        let err = client.call(Request::Ping).await.unwrap_err();
        assert!(
            matches!(err, IpcError::ReplyTimeout { timeout_ms: 50 }),
            "got: {err}"
        );
        assert!(err.to_string().contains("didn't respond"), "got: {err}");
    }

    #[tokio::test]
    async fn test_oversized_request_releases_to_server() {
        let config = IpcConfig {
            buffer_size: 64,
            ..IpcConfig::default()
        };
        let (_server_end, client_end) = MemoryTransport::pair(&config);
        let client = BridgeClient::new(client_end, &config);

        let err = client.add_tracker(waist("A-LONG-SERIAL")).await.unwrap_err();
        assert!(matches!(err, IpcError::Contract(_)), "got: {err}");
        assert_eq!(client.transport().available(Semaphore::ToServer), 1);
    }
}
