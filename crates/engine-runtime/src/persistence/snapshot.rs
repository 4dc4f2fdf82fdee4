//! # Engine Snapshots
//!
//! Board graphs are not persisted as such. A snapshot stores the message
//! set plus the ghost-thread tombstones, and graphs are rebuilt on restore.
//!
//! ## File layout
//!
//! ```text
//! <path>        bincode-encoded EngineSnapshot
//! <path>.tmp    written first, then renamed over <path>
//! <path>.lock   held exclusively by the owning process, contains its PID
//! ```

use crate::engine::Outbox;
use serde::{Deserialize, Serialize};
use shared_types::{BoardName, IdentityId, Message, MessageId, Timestamp};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tl_01_message_lists::MessageList;
use tl_03_fetch_retry::FetchFailedMarker;
use tl_04_subscribed_view::Subscriptions;
use tracing::{debug, info};

use fs2::FileExt;

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to bring an engine back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub version: u32,
    pub taken_at: Timestamp,
    /// Tracked boards, including empty ones.
    pub boards: Vec<BoardName>,
    /// Every stored message once, crossposts included.
    pub messages: Vec<Message>,
    pub ghost_threads: BTreeMap<BoardName, Vec<MessageId>>,
    pub lists: Vec<MessageList>,
    pub markers: Vec<FetchFailedMarker>,
    pub subscriptions: Subscriptions,
    pub outbox: Outbox,
    pub deleted_identities: Vec<IdentityId>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot encoding failed: {0}")]
    Encode(String),

    #[error("Snapshot decoding failed: {0}")]
    Decode(String),

    #[error("Snapshot lock {path:?} held by another process (pid {pid:?})")]
    Locked { pid: Option<u32>, path: PathBuf },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Snapshot file owned by this process for as long as the store lives.
pub struct FileSnapshotStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock: File,
}

impl FileSnapshotStore {
    /// Open the store and take its lock.
    ///
    /// # Errors
    ///
    /// `SnapshotError::Locked` if another store holds the lock.
    pub fn open(path: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let lock_path = Self::sidecar(&path, "lock");

        let mut lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock.try_lock_exclusive().is_err() {
            return Err(SnapshotError::Locked {
                pid: Self::read_pid(&lock_path),
                path: lock_path,
            });
        }

        lock.set_len(0)?;
        writeln!(lock, "{}", std::process::id())?;
        lock.sync_all()?;

        debug!(path = %path.display(), "Snapshot store opened");
        Ok(Self { path, lock_path, lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot`, replacing the previous one atomically.
    pub fn save(&self, snapshot: &EngineSnapshot) -> SnapshotResult<()> {
        let bytes = bincode::serialize(snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))?;
        let tmp = Self::sidecar(&self.path, "tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            messages = snapshot.messages.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// The stored snapshot, or `None` if none was written yet.
    pub fn load(&self) -> SnapshotResult<Option<EngineSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: EngineSnapshot =
            bincode::deserialize(&bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        debug!(path = %self.path.display(), messages = snapshot.messages.len(), "Snapshot loaded");
        Ok(Some(snapshot))
    }

    fn sidecar(path: &Path, extension: &str) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    fn read_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path).ok().and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for FileSnapshotStore {
    fn drop(&mut self) {
        let _ = self.lock.unlock();
        let _ = fs::remove_file(&self.lock_path);
    }
}
