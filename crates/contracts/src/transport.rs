//! Transport trait - half-duplex pipe + semaphore handshake
//!
//! Abstracts the OS named pipes and named semaphores so the service loop and
//! the client can run against an in-memory implementation.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::ContractError;

/// The three handshake semaphores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semaphore {
    /// Held available by the server except while it reads a request
    ToServer,
    /// Signaled by the server once a reply is queued
    FromServer,
    /// Signaled by the client to request a transaction
    Start,
}

impl fmt::Display for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToServer => f.write_str("to_server"),
            Self::FromServer => f.write_str("from_server"),
            Self::Start => f.write_str("start"),
        }
    }
}

/// The two pipe channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Client → server
    Request,
    /// Server → client
    Reply,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Reply => f.write_str("reply"),
        }
    }
}

/// Pipe + semaphore transport
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Wait for a semaphore; `None` waits forever. Returns false on timeout.
    async fn acquire(&self, semaphore: Semaphore, timeout: Option<Duration>) -> bool;

    /// Signal a semaphore (saturates at one permit)
    fn release(&self, semaphore: Semaphore);

    /// Open a channel for one frame
    async fn open(&self, channel: Channel) -> Result<(), ContractError>;

    /// Read one frame from an open channel
    async fn read(&self, channel: Channel) -> Result<Bytes, ContractError>;

    /// Write one frame to an open channel
    async fn write(&self, channel: Channel, frame: &[u8]) -> Result<(), ContractError>;

    /// Close a channel
    async fn close(&self, channel: Channel) -> Result<(), ContractError>;
}
