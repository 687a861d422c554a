//! Bundled catalog snapshot used when the store cannot be read

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One product of the snapshot.
///
/// Fields beyond the product shape (display ids, extra images, ...) are kept
/// in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotProduct {
    pub name: String,
    pub description: String,
    pub price: Number,
    pub details: String,
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where the fallback snapshot comes from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn load(&self) -> Result<Vec<SnapshotProduct>, SnapshotError>;
}

/// Snapshot read from a JSON file on every call
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshot {
    async fn load(&self) -> Result<Vec<SnapshotProduct>, SnapshotError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SnapshotError::Io {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_slice(&raw).map_err(|source| SnapshotError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
