//! ServerHandle - runs a supervised service loop on its own task

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use contracts::Transport;

use crate::server::{ServerExit, ServiceLoop};

/// Handle to a running service loop
///
/// The loop runs until [`shutdown`](Self::shutdown) is called, the supervisor
/// gives up, or the handle is dropped.
pub struct ServerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<ServerExit>,
}

impl ServerHandle {
    /// Spawn the supervised loop
    pub fn spawn<T>(service: ServiceLoop<T>) -> Self
    where
        T: Transport + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(service.supervise(shutdown_rx));
        Self { shutdown_tx, join }
    }

    /// True once the loop has stopped for any reason
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the loop and wait for it to tear the registry down
    #[instrument(name = "server_handle_shutdown", skip(self))]
    pub async fn shutdown(self) -> ServerExit {
        // Already gone if the supervisor gave up
        let _ = self.shutdown_tx.send(true);
        let exit = self.join().await;
        info!(exit = ?exit, "Server shutdown complete");
        exit
    }

    /// Wait for the loop to end on its own
    pub async fn join(self) -> ServerExit {
        let Self { shutdown_tx, join } = self;
        let exit = match join.await {
            Ok(exit) => exit,
            Err(e) => {
                error!(error = ?e, "Service loop task panicked");
                ServerExit::Panicked {
                    message: e.to_string(),
                }
            }
        };
        drop(shutdown_tx);
        exit
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
