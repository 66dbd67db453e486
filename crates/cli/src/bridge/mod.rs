//! In-process bridge: synthetic device source, conditioning and transport.

mod orchestrator;
mod source;
mod stats;

pub use orchestrator::{Bridge, BridgeSettings};
pub use stats::RunStats;
