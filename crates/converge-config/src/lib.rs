pub mod error;
pub mod profile;

pub use error::*;
pub use profile::{WaitProfile, WaitProfiles};

use std::path::PathBuf;

const CONFIG_ENV: &str = "CONVERGE_CONFIG_PATH";
const CONFIG_CANDIDATES: [&str; 2] = ["converge.local.yaml", "converge.yaml"];

/// Locate the converge config file
///
/// Search order:
/// 1. `CONVERGE_CONFIG_PATH` (direct path)
/// 2. current directory: converge.local.yaml, converge.yaml
/// 3. ./.converge/ directory, same order
/// 4. ~/.config/converge/converge.yaml (global)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points to a missing file: {}", CONFIG_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CONFIG_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let local_dir = current_dir.join(".converge");
    if local_dir.is_dir() {
        for filename in &CONFIG_CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("converge").join("converge.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}
