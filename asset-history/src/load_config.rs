//! `load_config` module: loads the optional YAML file that overrides remote endpoints.
//!
//! Only the endpoint URLs are configurable from file; run parameters come from flags. Any key
//! left out keeps its default, so a file may override a single URL.
//!
//! ```yaml
//! endpoints:
//!   versions: "https://mirror.example/assets/{asset_id}/versions?page={page}"
//!   content: "https://mirror.example/Asset?versionId={version_id}"
//!   cookie_domain: "https://mirror.example/"
//! ```

use anyhow::Result;
use asset_history_core::config::Endpoints;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub endpoints: Endpoints,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };
    Ok(config)
}
