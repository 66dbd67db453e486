//! Run statistics.

use std::time::Duration;

use ipc::ServerExit;
use observability::TransactionStats;

/// Statistics from a bridge run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Skeleton frames pushed through the client
    pub frames_pushed: u64,

    /// Client calls that failed at the transport level
    pub transport_failures: u64,

    /// Trackers registered at startup
    pub trackers: usize,

    /// Poses the host runtime received
    pub host_poses: usize,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-result tally and latency of vector updates
    pub transactions: TransactionStats,

    /// How the service loop ended
    pub server_exit: Option<ServerExit>,
}

impl RunStats {
    /// Frames pushed per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_pushed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Bridge Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Trackers: {}", self.trackers);
        println!("   ├─ Frames pushed: {}", self.frames_pushed);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Host poses: {}", self.host_poses);
        println!("   └─ Transport failures: {}", self.transport_failures);

        if let Some(ref exit) = self.server_exit {
            println!("\n🔌 Service loop: {:?}", exit);
        }

        println!("\n{}", self.transactions.summary());
    }
}
