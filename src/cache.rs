use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

/// Save a serializable value (a config, a composed order) as pretty JSON.
pub fn save_to_file<T: Serialize>(data: &T, path: &str) -> Result<()> {
    let file = File::create(path).map_err(|e| anyhow!("Failed to create {}: {}", path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, data)
        .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
    Ok(())
}

/// Load a deserializable value from a JSON file.
pub fn load_from_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let file = File::open(path).map_err(|e| anyhow!("Failed to open {}: {}", path, e))?;
    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader)
        .map_err(|e| anyhow!("Failed to parse {}: {}", path, e))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SdkConfig;

    #[test]
    fn test_config_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("sundae-route-config-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let config = SdkConfig {
            kupo_url: "http://kupo.local:1442".to_string(),
            ..SdkConfig::default()
        };
        save_to_file(&config, &path).unwrap();
        let loaded: SdkConfig = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_from_file::<SdkConfig>("/nonexistent/sundae-route.json").is_err());
    }
}
