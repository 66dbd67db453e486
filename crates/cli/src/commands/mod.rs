//! Command implementations.

mod info;
mod ping;
mod run;
mod validate;

pub use info::run_info;
pub use ping::run_ping;
pub use run::run_bridge;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use tracing::info;

/// Load the configuration file, or fall back to defaults when none is given
pub(crate) fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(BridgeConfig::default())
        }
    }
}
