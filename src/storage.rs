use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Durable key-value medium behind the credential store. One string value per
/// key, read and written whole; a missing key reads as `None`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// File-per-key storage rooted at the configured data directory.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub async fn new(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create data dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read key {key}")),
        }
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        tokio::fs::write(self.path_for(key), value)
            .await
            .with_context(|| format!("write key {key}"))
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove key {key}")),
        }
    }
}

/// In-memory storage used by unit tests and `AppState::fake`.
#[derive(Default)]
pub struct MemStorage {
    items: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl Storage for MemStorage {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}
