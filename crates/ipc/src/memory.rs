//! In-process transport.
//!
//! Two endpoints share three semaphores and two bounded byte pipes. The client
//! writes the request pipe and the server writes the reply pipe; opening your
//! own write pipe discards any stale bytes, and reads wait until a frame arrives
//! or the writer closes without one.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use contracts::{Channel, ContractError, IpcConfig, Semaphore, Transport};
use ringbuf::{traits::*, HeapRb};
use tokio::sync::{Notify, Semaphore as TokioSemaphore};

/// Which end of the transport an endpoint is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Client,
}

impl Side {
    fn writes(self) -> Channel {
        match self {
            Self::Server => Channel::Reply,
            Self::Client => Channel::Request,
        }
    }
}

struct Pipe {
    buffer: HeapRb<u8>,
    writer_open: bool,
}

struct PipeSlot {
    pipe: Mutex<Pipe>,
    ready: Notify,
}

impl PipeSlot {
    fn new(capacity: usize) -> Self {
        Self {
            pipe: Mutex::new(Pipe {
                buffer: HeapRb::new(capacity.max(1)),
                writer_open: false,
            }),
            ready: Notify::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Pipe> {
        self.pipe.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Shared {
    to_server: TokioSemaphore,
    from_server: TokioSemaphore,
    start: TokioSemaphore,
    request: PipeSlot,
    reply: PipeSlot,
    names: IpcConfig,
}

impl Shared {
    fn semaphore(&self, semaphore: Semaphore) -> &TokioSemaphore {
        match semaphore {
            Semaphore::ToServer => &self.to_server,
            Semaphore::FromServer => &self.from_server,
            Semaphore::Start => &self.start,
        }
    }

    fn pipe(&self, channel: Channel) -> &PipeSlot {
        match channel {
            Channel::Request => &self.request,
            Channel::Reply => &self.reply,
        }
    }

    fn pipe_name(&self, channel: Channel) -> &str {
        match channel {
            Channel::Request => &self.names.request_pipe,
            Channel::Reply => &self.names.reply_pipe,
        }
    }
}

/// One endpoint of an in-process transport
#[derive(Clone)]
pub struct MemoryTransport {
    shared: Arc<Shared>,
    side: Side,
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("side", &self.side)
            .field("request_pipe", &self.shared.names.request_pipe)
            .field("reply_pipe", &self.shared.names.reply_pipe)
            .finish()
    }
}

impl MemoryTransport {
    /// Server and client endpoints over fresh semaphores and pipes
    ///
    /// The to-server semaphore starts signaled so the first client can write.
    pub fn pair(config: &IpcConfig) -> (Self, Self) {
        let shared = Arc::new(Shared {
            to_server: TokioSemaphore::new(1),
            from_server: TokioSemaphore::new(0),
            start: TokioSemaphore::new(0),
            request: PipeSlot::new(config.buffer_size),
            reply: PipeSlot::new(config.buffer_size),
            names: config.clone(),
        });
        (
            Self {
                shared: Arc::clone(&shared),
                side: Side::Server,
            },
            Self {
                shared,
                side: Side::Client,
            },
        )
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Permits currently available on a semaphore
    pub fn available(&self, semaphore: Semaphore) -> usize {
        self.shared.semaphore(semaphore).available_permits()
    }

    fn error(&self, channel: Channel, message: impl Into<String>) -> ContractError {
        ContractError::transport(self.shared.pipe_name(channel), message)
    }

    fn check_writer(&self, channel: Channel) -> Result<(), ContractError> {
        if self.side.writes() == channel {
            Ok(())
        } else {
            Err(self.error(channel, format!("{:?} endpoint cannot write {channel}", self.side)))
        }
    }

    fn check_reader(&self, channel: Channel) -> Result<(), ContractError> {
        if self.side.writes() == channel {
            Err(self.error(channel, format!("{:?} endpoint cannot read {channel}", self.side)))
        } else {
            Ok(())
        }
    }
}

impl Transport for MemoryTransport {
    async fn acquire(&self, semaphore: Semaphore, timeout: Option<Duration>) -> bool {
        let sem = self.shared.semaphore(semaphore);
        if let Ok(permit) = sem.try_acquire() {
            permit.forget();
            return true;
        }
        let acquired = match timeout {
            Some(timeout) if timeout.is_zero() => return false,
            Some(timeout) => tokio::time::timeout(timeout, sem.acquire()).await.ok(),
            None => Some(sem.acquire().await),
        };
        match acquired {
            Some(Ok(permit)) => {
                permit.forget();
                true
            }
            _ => false,
        }
    }

    fn release(&self, semaphore: Semaphore) {
        let sem = self.shared.semaphore(semaphore);
        if sem.available_permits() == 0 {
            sem.add_permits(1);
        }
    }

    async fn open(&self, channel: Channel) -> Result<(), ContractError> {
        if self.side.writes() == channel {
            let mut pipe = self.shared.pipe(channel).lock();
            pipe.buffer.clear();
            pipe.writer_open = true;
        }
        Ok(())
    }

    async fn read(&self, channel: Channel) -> Result<Bytes, ContractError> {
        self.check_reader(channel)?;
        let slot = self.shared.pipe(channel);
        loop {
            let ready = slot.ready.notified();
            {
                let mut pipe = slot.lock();
                if !pipe.buffer.is_empty() {
                    let frame: Vec<u8> = pipe.buffer.pop_iter().collect();
                    return Ok(Bytes::from(frame));
                }
                if !pipe.writer_open {
                    return Err(self.error(channel, "writer closed without a frame"));
                }
            }
            ready.await;
        }
    }

    async fn write(&self, channel: Channel, frame: &[u8]) -> Result<(), ContractError> {
        self.check_writer(channel)?;
        let slot = self.shared.pipe(channel);
        {
            let mut pipe = slot.lock();
            if !pipe.writer_open {
                return Err(self.error(channel, "pipe is not open"));
            }
            let vacant = pipe.buffer.vacant_len();
            if frame.len() > vacant {
                return Err(self.error(
                    channel,
                    format!("frame of {} bytes exceeds pipe buffer ({vacant} free)", frame.len()),
                ));
            }
            pipe.buffer.push_slice(frame);
        }
        slot.ready.notify_one();
        Ok(())
    }

    async fn close(&self, channel: Channel) -> Result<(), ContractError> {
        if self.side.writes() == channel {
            self.shared.pipe(channel).lock().writer_open = false;
            self.shared.pipe(channel).ready.notify_one();
        }
        Ok(())
    }
}
