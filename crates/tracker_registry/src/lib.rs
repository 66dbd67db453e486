//! # Tracker Registry
//!
//! Owns the canonical tracker set and applies protocol requests to it.
//!
//! Responsibilities:
//! - Register trackers, rejecting empty and duplicate serials
//! - Announce trackers to the host runtime with bounded retries
//! - Apply pose/data updates now or after their offset
//! - Translate host activation callbacks into device slots and property sets
//!
//! ## Usage
//!
//! ```ignore
//! let host = Arc::new(MockHost::new());
//! let mut registry = Registry::new(host, RegistryConfig::default());
//!
//! let response = registry.dispatch(&request).await;
//! registry.tick().await; // delayed updates + host callbacks
//! ```

mod adapter;
mod deferred;
mod error;
mod mock_host;
mod registry;
mod tracker;

pub use adapter::{device_properties, driver_pose, DeviceAdapter, INPUT_CLICK, OUTPUT_HAPTIC};
pub use deferred::{DeferredQueue, DeferredUpdate};
pub use error::{RegistryError, Result};
pub use mock_host::{MockHost, MockHostConfig};
pub use registry::{Registry, TrackerCounts};
pub use tracker::{DataChange, TrackerEntity};
