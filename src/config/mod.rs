//! JSON configs for the command-line tools.

pub mod plate;
pub mod verify;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}
