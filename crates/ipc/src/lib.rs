//! # IPC
//!
//! Transport, wire codec and service loop between the application and the driver.
//!
//! Responsibilities:
//! - Encode/decode protocol messages as hex-encoded JSON frames
//! - Run the fixed-rate service loop and dispatch requests to the registry
//! - Supervise the loop and give up after repeated crashes
//! - Provide the application-side client
//!
//! ## Usage
//!
//! ```ignore
//! let (server_end, client_end) = MemoryTransport::pair(&config.ipc);
//! let server = ServerHandle::spawn(ServiceLoop::new(server_end, registry, config.ipc.clone()));
//!
//! let client = BridgeClient::new(client_end, &config.ipc);
//! let response = client.add_tracker(base).await?;
//!
//! server.shutdown().await;
//! ```

mod client;
mod codec;
mod error;
mod handle;
mod memory;
mod server;

pub use client::{BridgeClient, ConnectionTest};
pub use codec::{decode_request, decode_response, encode_request, encode_response};
pub use error::{IpcError, Result};
pub use handle::ServerHandle;
pub use memory::{MemoryTransport, Side};
pub use server::{ServerExit, ServiceLoop};
