use crate::core::settings::{ExchangeSettings, SettingsStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Settings persisted as a pretty-printed JSON file.
pub struct FileSettingsStore {
    path: PathBuf,
    defaults: ExchangeSettings,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P, defaults: ExchangeSettings) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            defaults,
            lock: Mutex::new(()),
        }
    }

    async fn read_or_create(&self) -> Result<ExchangeSettings> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to access settings file: {}", self.path.display()))?
        {
            info!("Creating default settings at {}", self.path.display());
            self.write(&self.defaults).await?;
            return Ok(self.defaults.clone());
        }

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file: {}", self.path.display()))?;
        debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    async fn write(&self, settings: &ExchangeSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let body = serde_json::to_string_pretty(settings)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, body)
            .await
            .with_context(|| format!("Failed to write settings file: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace settings file: {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<ExchangeSettings> {
        let _guard = self.lock.lock().await;
        self.read_or_create().await
    }

    async fn save_rate(&self, rate: f64) -> Result<ExchangeSettings> {
        let _guard = self.lock.lock().await;
        let current = self.read_or_create().await?;
        let updated = ExchangeSettings {
            admin_secret: current.admin_secret,
            bridge_to_local_rate: Some(rate),
        };
        self.write(&updated).await?;
        debug!("Saved settings to {}", self.path.display());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn defaults() -> ExchangeSettings {
        ExchangeSettings {
            admin_secret: "s3cret".to_string(),
            bridge_to_local_rate: Some(2600.0),
        }
    }

    #[tokio::test]
    async fn test_creates_defaults_on_first_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileSettingsStore::new(&path, defaults());

        let settings = store.load().await.unwrap();
        assert_eq!(settings, defaults());
        assert!(path.exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"admin_password\": \"s3cret\""));
        assert!(raw.contains("\"usdt_tzs\": 2600.0"));
    }

    #[tokio::test]
    async fn test_save_rate_preserves_secret() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "admin_password": "kept", "usdt_tzs": 2500 }"#).unwrap();
        let store = FileSettingsStore::new(&path, defaults());

        let saved = store.save_rate(3000.0).await.unwrap();
        assert_eq!(saved.admin_secret, "kept");
        assert_eq!(saved.bridge_to_local_rate, Some(3000.0));

        let reopened = FileSettingsStore::new(&path, defaults());
        assert_eq!(reopened.load().await.unwrap(), saved);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileSettingsStore::new(&path, defaults());

        let err = store.load().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }
}
