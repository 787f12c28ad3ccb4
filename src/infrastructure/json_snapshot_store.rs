//! Flat-file snapshot store
//!
//! The snapshot is a pretty-printed JSON array of
//! `{product_title, product_price, path_to_image}` objects. Each save goes to
//! its own sibling temp file that is renamed over the target, so readers never
//! see a half-written snapshot and concurrent saves end last-write-wins.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::product::ProductRecord;
use crate::domain::repositories::{SnapshotStore, StoreError};

pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique per call: `<file>.<uuid>.tmp` in the target's directory
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {:?}; starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(Self::io_error(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<ProductRecord> = serde_json::from_slice(&bytes)?;
        debug!("📂 Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    async fn save(&self, records: &[ProductRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(parent, e))?;
        }

        let body = serde_json::to_vec_pretty(records)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, body)
            .await
            .map_err(|e| Self::io_error(&temp, e))?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(Self::io_error(&self.path, e));
        }

        info!("💾 Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}
