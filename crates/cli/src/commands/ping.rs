//! `ping` command implementation.

use std::sync::Arc;

use anyhow::Result;
use ipc::{BridgeClient, MemoryTransport, ServerHandle, ServiceLoop};
use observability::RunningStats;
use tracing::{info, warn};
use tracker_registry::{MockHost, Registry};

use crate::cli::PingArgs;

/// Execute the `ping` command
pub async fn run_ping(args: &PingArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;

    let registry = Registry::new(Arc::new(MockHost::new()), config.registry.clone());
    let (server_end, client_end) = MemoryTransport::pair(&config.ipc);
    let server = ServerHandle::spawn(ServiceLoop::new(server_end, registry, config.ipc.clone()));
    let client = BridgeClient::new(client_end, &config.ipc);

    let mut round_trips = RunningStats::default();
    let mut lost = 0u32;

    for seq in 1..=args.count {
        match client.test_connection().await {
            Ok(test) => {
                let server_us = test.response.timestamp_us - test.response.manual_timestamp_us;
                println!(
                    "reply {}: result={} time={} µs (server {} µs)",
                    seq,
                    test.response.result.as_str(),
                    test.elapsed_us,
                    server_us
                );
                round_trips.push(test.elapsed_us as f64);
            }
            Err(e) => {
                lost += 1;
                warn!(seq, error = %e, "Ping failed");
                println!("reply {}: {}", seq, e);
            }
        }
    }

    let exit = server.shutdown().await;
    info!(exit = ?exit, "In-process server stopped");

    println!(
        "\n{} sent, {} lost, round trip (µs): {}",
        args.count,
        lost,
        observability::StatsSummary::from(&round_trips)
    );

    if lost == args.count && args.count > 0 {
        anyhow::bail!("Connection test failed: no ping was answered");
    }
    Ok(())
}
