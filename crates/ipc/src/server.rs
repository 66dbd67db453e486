//! Service loop - fixed-rate transaction servicing

use std::time::Duration;

use bytes::Bytes;
use contracts::{
    timestamp_now_us, Channel, IpcConfig, ResponseMessage, ResultCode, Semaphore, Transport,
};
use observability::{record_loop_crash, record_parse_failure, record_start_timeout, record_transaction};
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};
use tracker_registry::Registry;

use crate::codec::{decode_request, encode_response};
use crate::{IpcError, Result};

/// How a supervised service loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum ServerExit {
    /// Shutdown was requested
    Shutdown,
    /// Too many consecutive crashes; no further transactions are serviced
    GaveUp { crashes: u32, error: String },
    /// The loop task panicked
    Panicked { message: String },
}

/// Server side of the bridge
///
/// Sole owner of the [`Registry`]. Each tick applies due delayed updates and host
/// callbacks, then waits for a start signal until the next tick is due.
pub struct ServiceLoop<T> {
    transport: T,
    registry: Registry,
    config: IpcConfig,
    served: u64,
}

impl<T: Transport + Sync> ServiceLoop<T> {
    pub fn new(transport: T, registry: Registry, config: IpcConfig) -> Self {
        Self {
            transport,
            registry,
            config,
            served: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Transactions completed so far
    pub fn served(&self) -> u64 {
        self.served
    }

    fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.loop_rate_hz.max(1.0))
    }

    /// Run the loop body until shutdown or a transport failure
    ///
    /// Returns `Ok` on shutdown. A dropped shutdown sender counts as shutdown.
    #[instrument(name = "service_loop_run", skip_all)]
    pub async fn run(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let period = self.period();
        let start_timeout = Duration::from_millis(self.config.start_timeout_ms);
        let mut next = Instant::now();
        let mut last_start = Instant::now();

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }
            next += period;

            let applied = self.registry.tick().await;
            if applied > 0 {
                debug!(applied, "Applied delayed updates and host events");
            }

            let wait = next.saturating_duration_since(Instant::now());
            let started = tokio::select! {
                biased;
                _ = shutdown.changed() => return Ok(()),
                started = self.transport.acquire(Semaphore::Start, Some(wait)) => started,
            };

            if started {
                self.transaction().await?;
                last_start = Instant::now();
            } else if last_start.elapsed() >= start_timeout {
                // Recover from a client that died mid-handshake
                self.transport.release(Semaphore::ToServer);
                record_start_timeout();
                debug!(
                    timeout_ms = self.config.start_timeout_ms,
                    "No start signal, released to-server semaphore"
                );
                last_start = Instant::now();
            }

            let now = Instant::now();
            if next > now {
                sleep_until(next).await;
            } else {
                next = now;
            }
        }
    }

    /// Run the loop, restarting it after each crash
    ///
    /// Gives up after `max_crashes` consecutive crashes. A crash that follows at
    /// least one completed transaction starts a new streak. The registry is shut
    /// down whichever way the loop ends.
    #[instrument(
        name = "service_loop_supervise",
        skip_all,
        fields(max_crashes = self.config.max_crashes)
    )]
    pub async fn supervise(mut self, mut shutdown: watch::Receiver<bool>) -> ServerExit {
        info!(
            rate_hz = self.config.loop_rate_hz,
            request_pipe = %self.config.request_pipe,
            reply_pipe = %self.config.reply_pipe,
            "Service loop started"
        );

        let mut crashes = 0u32;
        let exit = loop {
            let served_before = self.served;
            match self.run(&mut shutdown).await {
                Ok(()) => break ServerExit::Shutdown,
                Err(e) => {
                    if self.served > served_before {
                        crashes = 0;
                    }
                    crashes += 1;
                    record_loop_crash(crashes);
                    error!(error = %e, crashes, "Service loop crashed");
                    self.recover().await;

                    if crashes >= self.config.max_crashes {
                        break ServerExit::GaveUp {
                            crashes,
                            error: e.to_string(),
                        };
                    }
                }
            }
        };

        self.registry.shutdown();
        info!(exit = ?exit, served = self.served, "Service loop stopped");
        exit
    }

    #[instrument(name = "service_loop_transaction", skip(self))]
    async fn transaction(&mut self) -> Result<()> {
        let started = Instant::now();
        let frame = self.read_request().await?;
        let parse_started_us = timestamp_now_us();

        let (mut response, want_reply) = match decode_request(&frame) {
            Ok(message) => {
                if !message.want_reply {
                    // No reply will be read; the sender is done with the pipe
                    self.transport.release(Semaphore::ToServer);
                }
                let kind = message.message_type();
                let response = self.registry.dispatch(&message.request).await;
                record_transaction(
                    kind,
                    response.result,
                    started.elapsed().as_secs_f64() * 1e6,
                );
                (response, message.want_reply)
            }
            Err(e) => {
                record_parse_failure();
                warn!(error = %e, bytes = frame.len(), "Rejected undecodable request");
                // The sender's reply flag is unknown; it may be waiting.
                (ResponseMessage::failure(ResultCode::ParsingError), true)
            }
        };
        response.manual_timestamp_us = parse_started_us;

        if want_reply {
            self.send_reply(&mut response).await?;
        }
        self.served += 1;
        Ok(())
    }

    async fn read_request(&self) -> Result<Bytes> {
        let timeout_ms = self.config.reply_timeout_ms;
        self.transport.open(Channel::Request).await?;
        let read = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.transport.read(Channel::Request),
        )
        .await;
        self.transport.close(Channel::Request).await?;

        match read {
            Ok(frame) => Ok(frame?),
            Err(_) => Err(IpcError::RequestTimeout { timeout_ms }),
        }
    }

    async fn send_reply(&self, response: &mut ResponseMessage) -> Result<()> {
        response.timestamp_us = timestamp_now_us();
        let frame = encode_response(response)?;

        self.transport.open(Channel::Reply).await?;
        self.transport.release(Semaphore::FromServer);
        let written = self.transport.write(Channel::Reply, &frame).await;
        self.transport.close(Channel::Reply).await?;
        written.map_err(IpcError::from)
    }

    async fn recover(&self) {
        self.transport.release(Semaphore::ToServer);
        if let Err(e) = self.transport.close(Channel::Reply).await {
            warn!(error = %e, "Failed to close reply channel after crash");
        }
    }
}

impl<T> std::fmt::Debug for ServiceLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLoop")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("served", &self.served)
            .finish()
    }
}
