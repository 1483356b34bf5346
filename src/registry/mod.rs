//! Device registry
//!
//! Keyed store of every serial the bot has accepted, backed by a single JSON
//! file that is rewritten in full on each accepted insertion. All mutation
//! goes through [`DeviceRegistry::insert_if_absent`], which holds the write
//! lock across the whole check-insert-persist sequence so two concurrent
//! captures of the same plate cannot both be accepted.

mod record;

pub use record::{display_offset, format_captured_at, DeviceRecord, TIMESTAMP_FORMAT};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

/// Outcome of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The serial was new and is now recorded.
    Recorded,
    /// The serial already had a record; nothing changed.
    Duplicate,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("registry file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode registry: {0}")]
    Encode(serde_json::Error),

    #[error("failed to write registry file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// File-backed registry of recorded devices. Clones share the same store.
#[derive(Clone)]
pub struct DeviceRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    path: PathBuf,
    devices: RwLock<BTreeMap<String, DeviceRecord>>,
}

impl DeviceRegistry {
    /// Load the registry from `path`, creating an empty file when absent.
    /// A file that exists but does not parse is a startup error; silently
    /// starting over would resurrect every recorded serial as "new".
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        let path = path.to_path_buf();
        let devices = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                RegistryError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = BTreeMap::new();
                write_file(&path, &empty).await?;
                empty
            }
            Err(source) => return Err(RegistryError::Read { path, source }),
        };

        tracing::info!(count = devices.len(), path = %path.display(), "registry loaded");
        Ok(Self {
            inner: Arc::new(RegistryInner {
                path,
                devices: RwLock::new(devices),
            }),
        })
    }

    /// Record `serial` unless it already has a record; the first write wins.
    ///
    /// A failed file rewrite is logged and swallowed: the in-memory record
    /// stands, and durability catches up on the next successful rewrite.
    pub async fn insert_if_absent(&self, serial: &str, record: DeviceRecord) -> InsertOutcome {
        let mut devices = self.inner.devices.write().await;
        if devices.contains_key(serial) {
            return InsertOutcome::Duplicate;
        }
        devices.insert(serial.to_string(), record);

        match write_file(&self.inner.path, &devices).await {
            Ok(()) => {
                tracing::info!(%serial, count = devices.len(), "device recorded");
            }
            Err(e) => {
                tracing::error!(%serial, "registry not persisted: {e}");
            }
        }
        InsertOutcome::Recorded
    }

    /// Whether `serial` already has a record.
    pub async fn contains(&self, serial: &str) -> bool {
        self.inner.devices.read().await.contains_key(serial)
    }

    /// Number of recorded devices.
    pub async fn len(&self) -> usize {
        self.inner.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.devices.read().await.is_empty()
    }

    /// Snapshot of all records in serial order.
    pub async fn snapshot(&self) -> Vec<(String, DeviceRecord)> {
        self.inner
            .devices
            .read()
            .await
            .iter()
            .map(|(serial, record)| (serial.clone(), record.clone()))
            .collect()
    }
}

async fn write_file(
    path: &Path,
    devices: &BTreeMap<String, DeviceRecord>,
) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| RegistryError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
    }

    let json = serde_json::to_string_pretty(devices).map_err(RegistryError::Encode)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| RegistryError::Write {
            path: path.to_path_buf(),
            source,
        })
}
