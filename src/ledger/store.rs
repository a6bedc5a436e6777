//! Persistence backends for the review ledger.
//!
//! The ledger is always read and written whole: `load` returns a snapshot,
//! `save` replaces the persisted document with a new one. There is no locking;
//! a single writer at a time is assumed.

use super::record::{LedgerSnapshot, ReviewRecord};
use crate::errors::LedgerError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Repository interface for the ledger document.
pub trait LedgerStore: Send + Sync {
    /// Read the current snapshot. Missing or unreadable data yields an empty ledger;
    /// records that fail to parse are skipped.
    fn load(&self) -> LedgerSnapshot;

    /// Durably replace the persisted snapshot.
    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError>;
}

/// Ledger document with records left unparsed.
#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    reviews: BTreeMap<String, serde_json::Value>,
}

/// Ledger persisted as a pretty-printed JSON document.
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

    /// Where an unparseable document is copied before it can be replaced.
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn keep_backup(&self) -> Option<PathBuf> {
        let backup = self.backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => Some(backup),
            Err(e) => {
                warn!(path = %backup.display(), error = %e, "Could not back up ledger");
                None
            }
        }
    }

    /// Records that still parse when the document as a whole does not.
    fn salvage(content: &str) -> Option<LedgerSnapshot> {
        let raw: RawSnapshot = serde_json::from_str(content).ok()?;
        let mut snapshot = LedgerSnapshot::default();
        for (key, value) in raw.reviews {
            match serde_json::from_value::<ReviewRecord>(value) {
                Ok(record) => {
                    snapshot.reviews.insert(key, record);
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable ledger record"),
            }
        }
        Some(snapshot)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> LedgerSnapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return LedgerSnapshot::default();
            }
            Err(e) => {
                let path = self.path.display();
                warn!(path = %path, error = %e, "Ledger unreadable, treating as empty");
                return LedgerSnapshot::default();
            }
        };

        if content.trim().is_empty() {
            return LedgerSnapshot::default();
        }

        let error = match serde_json::from_str(&content) {
            Ok(snapshot) => return snapshot,
            Err(e) => e,
        };

        let backup = self
            .keep_backup()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string());

        match Self::salvage(&content) {
            Some(snapshot) => {
                warn!(
                    path = %self.path.display(),
                    %backup,
                    %error,
                    kept = snapshot.reviews.len(),
                    "Ledger is partly corrupt, keeping readable records"
                );
                snapshot
            }
            None => {
                warn!(
                    path = %self.path.display(),
                    %backup,
                    %error,
                    "Ledger is corrupt, treating as empty"
                );
                LedgerSnapshot::default()
            }
        }
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        // The ledger on disk is only ever replaced whole.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), reviews = snapshot.reviews.len(), "Ledger saved");
        Ok(())
    }
}

/// In-process ledger for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<LedgerSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> LedgerSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();
        Ok(())
    }
}
