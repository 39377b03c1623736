use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::estimation::EstimationConfig;
use crate::session::ScanConfig;

/// Everything a host can tune, as one serializable document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub scan: ScanConfig,
    pub estimation: EstimationConfig,
}

/// Disk-backed configuration store. Hosts that don't persist settings can
/// use `PipelineConfig::default()` directly.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<PipelineConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            PipelineConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, config: PipelineConfig) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = config;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &PipelineConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("pulsecam-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let store = ConfigStore::new(scratch_path()).unwrap();
        let config = store.pipeline();
        assert_eq!(config.scan.target_duration_secs, 30);
        assert_eq!(config.estimation.timeout_secs, 30);
    }

    #[test]
    fn update_persists_and_reloads() {
        let path = scratch_path();
        let store = ConfigStore::new(path.clone()).unwrap();

        let mut config = store.pipeline();
        config.scan.target_duration_secs = 45;
        store.update(config).unwrap();

        let reopened = ConfigStore::new(path.clone()).unwrap();
        assert_eq!(reopened.pipeline().scan.target_duration_secs, 45);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let path = scratch_path();
        fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(path.clone()).unwrap();
        assert_eq!(store.pipeline().scan.nominal_fps, 30);
        let _ = fs::remove_file(path);
    }
}
