//! Unique visitor counting.
//!
//! Identifiers are hashed with SHA-256 and kept as a JSON array of hex
//! strings. One [`VisitorLedger`] should own a given file; it serializes
//! every read-modify-write through an async mutex and replaces the file with
//! a rename, so concurrent recorders never lose an entry and readers never
//! see a partial write.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default location of the persisted set
pub const DEFAULT_VISITORS_FILE: &str = "data/visitors.json";

/// Set of hashed visitor identifiers, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorSet {
    hashes: Vec<String>,
}

impl VisitorSet {
    /// Builds a set from persisted hashes, dropping repeats
    pub fn from_hashes(hashes: Vec<String>) -> Self {
        let mut set = Self::default();
        for hash in hashes {
            set.insert(hash);
        }
        set
    }

    /// Adds `hash`; returns false if it was already present
    pub fn insert(&mut self, hash: String) -> bool {
        if self.contains(&hash) {
            return false;
        }
        self.hashes.push(hash);
        true
    }

    /// Whether `hash` is present
    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.iter().any(|h| h == hash)
    }

    /// Number of unique visitors
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True when nobody has been recorded
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Hashes in first-seen order
    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }
}

/// Lowercase hex SHA-256 of an identifier
pub fn hash_identifier(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hex::encode(hasher.finalize())
}

/// File-backed unique visitor counter
#[derive(Debug)]
pub struct VisitorLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl VisitorLedger {
    /// Creates a ledger persisted at `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the persisted set
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `identifier` and returns the number of unique visitors
    pub async fn record(&self, identifier: &str) -> Result<usize> {
        let hash = hash_identifier(identifier);
        let _guard = self.lock.lock().await;

        let mut set = self.load().await?;
        if set.insert(hash) {
            self.save(&set).await?;
            debug!("Recorded new visitor, {} total", set.len());
        }
        Ok(set.len())
    }

    /// Number of unique visitors, without recording anyone
    pub async fn peek(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.len())
    }

    async fn load(&self) -> Result<VisitorSet> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(VisitorSet::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<String>>(&data) {
            Ok(hashes) => Ok(VisitorSet::from_hashes(hashes)),
            Err(e) => {
                warn!("Ignoring unreadable visitor file {}: {}", self.path.display(), e);
                Ok(VisitorSet::default())
            }
        }
    }

    async fn save(&self, set: &VisitorSet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_string(set.hashes())?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let written = match tokio::fs::write(&tmp, data).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                debug!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}
