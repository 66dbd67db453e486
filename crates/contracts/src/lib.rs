//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the tracker bridge.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Protocol timestamps are microseconds since the Unix epoch (`i64`)
//! - Delayed updates carry a relative offset in milliseconds (`f64`)

mod config;
mod error;
mod host;
mod joint;
mod message;
mod pose;
mod tracker;
mod transport;

pub use config::*;
pub use error::*;
pub use host::*;
pub use joint::*;
pub use message::*;
pub use pose::*;
pub use tracker::*;
pub use transport::{Channel, LocalTransport, Semaphore, Transport};
