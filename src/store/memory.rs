use crate::core::settings::{ExchangeSettings, SettingsStore};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory settings store, for tests and embedding
pub struct MemorySettingsStore {
    inner: Mutex<ExchangeSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: ExchangeSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(ExchangeSettings::default())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<ExchangeSettings> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save_rate(&self, rate: f64) -> Result<ExchangeSettings> {
        let mut settings = self.inner.lock().await;
        settings.bridge_to_local_rate = Some(rate);
        debug!(rate, "Settings PUT");
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_rate_keeps_secret() {
        let store = MemorySettingsStore::default();
        let before = store.load().await.unwrap();

        let after = store.save_rate(3100.0).await.unwrap();
        assert_eq!(after.admin_secret, before.admin_secret);
        assert_eq!(after.bridge_to_local_rate, Some(3100.0));
        assert_eq!(store.load().await.unwrap(), after);
    }
}
