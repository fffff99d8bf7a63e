//! Endpoint registry persistence

use crate::schema::{Endpoint, Meta, RegistryFile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Source of the record snapshot and sink for the merged set
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Endpoint>>;

    /// Replace the stored set wholesale
    async fn replace_all(&self, endpoints: Vec<Endpoint>) -> Result<()>;
}

/// endpoints.yaml on disk
pub struct YamlStore {
    path: PathBuf,
}

impl YamlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<RegistryFile> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Write via a sibling temp file and rename so a crash never leaves a half-written registry
    pub async fn write(&self, file: &RegistryFile) -> Result<()> {
        let yaml = serde_yaml::to_string(file)?;
        let tmp = self.path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, yaml)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for YamlStore {
    async fn load_all(&self) -> Result<Vec<Endpoint>> {
        Ok(self.read().await?.endpoints)
    }

    async fn replace_all(&self, endpoints: Vec<Endpoint>) -> Result<()> {
        // only a missing file starts fresh; a broken one must not lose its meta silently
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let meta = if exists {
            self.read().await?.meta
        } else {
            new_meta()
        };

        let file = RegistryFile {
            meta: Meta {
                last_probed: Some(Utc::now().to_rfc3339()),
                tool: "site-probe".to_string(),
                total_endpoints: endpoints.len(),
                ..meta
            },
            endpoints,
        };

        self.write(&file).await?;
        tracing::info!(path = %self.path.display(), endpoints = file.meta.total_endpoints, "Registry updated");
        Ok(())
    }
}

/// In-memory store, handy for embedding and tests
#[derive(Default)]
pub struct MemoryStore {
    endpoints: Mutex<Vec<Endpoint>>,
}

impl MemoryStore {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints: Mutex::new(endpoints),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<Endpoint>> {
        Ok(self.endpoints.lock().await.clone())
    }

    async fn replace_all(&self, endpoints: Vec<Endpoint>) -> Result<()> {
        *self.endpoints.lock().await = endpoints;
        Ok(())
    }
}

pub fn new_meta() -> Meta {
    Meta {
        created: Utc::now().format("%Y-%m-%d").to_string(),
        last_probed: None,
        tool: "site-probe".to_string(),
        total_endpoints: 0,
    }
}
