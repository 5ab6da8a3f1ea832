//! Durable snapshots of the position book

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::position::manager::TradeStats;
use crate::position::Position;

const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume the manager after a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub open: Vec<Position>,
    /// Most recent closed positions, oldest first
    pub closed: Vec<Position>,
    pub stats: TradeStats,
}

impl PositionSnapshot {
    pub fn new(open: Vec<Position>, closed: Vec<Position>, stats: TradeStats) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            open,
            closed,
            stats,
        }
    }
}

/// Persistence for position snapshots
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Atomically replace the stored snapshot
    async fn save(&self, snapshot: &PositionSnapshot) -> Result<()>;

    /// Load the stored snapshot, if any
    async fn load(&self) -> Result<Option<PositionSnapshot>>;
}

/// JSON file store. Writes go to a temp file that is renamed over the target.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "positions.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PositionStore for JsonFileStore {
    async fn save(&self, snapshot: &PositionSnapshot) -> Result<()> {
        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| Error::PositionPersistence(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::PositionPersistence(e.to_string()))?;
            }
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| Error::PositionPersistence(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::PositionPersistence(e.to_string()))?;

        debug!(
            "Saved {} open / {} closed positions to {}",
            snapshot.open.len(),
            snapshot.closed.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<PositionSnapshot>> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| Error::PositionPersistence(e.to_string()))?
        {
            return Ok(None);
        }

        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::PositionPersistence(e.to_string()))?;
        let snapshot: PositionSnapshot = serde_json::from_str(&data)
            .map_err(|e| Error::PositionPersistence(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::PositionPersistence(format!(
                "unsupported snapshot version {} in {}",
                snapshot.version,
                self.path.display()
            )));
        }

        info!(
            "Loaded {} open / {} closed positions from {}",
            snapshot.open.len(),
            snapshot.closed.len(),
            self.path.display()
        );
        Ok(Some(snapshot))
    }
}

/// In-memory store for hosts that do not need durability
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<PositionSnapshot>>,
    saves: std::sync::atomic::AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots written so far
    pub fn save_count(&self) -> u64 {
        self.saves.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// The most recently saved snapshot
    pub async fn latest(&self) -> Option<PositionSnapshot> {
        self.snapshot.lock().await.clone()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn save(&self, snapshot: &PositionSnapshot) -> Result<()> {
        *self.snapshot.lock().await = Some(snapshot.clone());
        self.saves
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    async fn load(&self) -> Result<Option<PositionSnapshot>> {
        Ok(self.snapshot.lock().await.clone())
    }
}
