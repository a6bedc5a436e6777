//! Persistent review ledger.
//!
//! Maps a local document key to its [`ReviewRecord`]. Every operation is a
//! whole-ledger read-modify-write against a [`LedgerStore`], so the ledger
//! survives across process invocations and stays the single source of truth
//! for what is outstanding.

pub mod record;
pub mod store;

pub use record::{LedgerSnapshot, ReviewRecord, ReviewStatus};
pub use store::{JsonFileStore, LedgerStore, MemoryStore};

use crate::errors::LedgerError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

pub struct Ledger {
    store: Box<dyn LedgerStore>,
}

impl Ledger {
    pub fn new(store: impl LedgerStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Ledger backed by the JSON document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStore::new(path))
    }

    /// Create or overwrite the Pending record for `local_key`.
    ///
    /// Last submission wins; no history is kept. The record is persisted
    /// before this returns.
    pub fn record_submission(
        &self,
        local_key: &str,
        device_path: &str,
        original_local_path: PathBuf,
    ) -> Result<ReviewRecord, LedgerError> {
        let mut snapshot = self.store.load();
        let record = ReviewRecord::pending(device_path, original_local_path);
        if snapshot
            .reviews
            .insert(local_key.to_string(), record.clone())
            .is_some()
        {
            info!(key = local_key, "Replacing earlier review record");
        }
        self.store.save(&snapshot)?;
        info!(key = local_key, device_path, "Review pending");
        Ok(record)
    }

    /// All Pending records, keyed and ordered by local key.
    pub fn list_pending(&self) -> BTreeMap<String, ReviewRecord> {
        self.store
            .load()
            .reviews
            .into_iter()
            .filter(|(_, record)| record.is_pending())
            .collect()
    }

    /// Transition `local_key` from Pending to Completed.
    pub fn mark_completed(&self, local_key: &str) -> Result<ReviewRecord, LedgerError> {
        let mut snapshot = self.store.load();
        let record = snapshot
            .reviews
            .get_mut(local_key)
            .ok_or_else(|| LedgerError::NotFound(local_key.to_string()))?;

        if !record.is_pending() {
            return Err(LedgerError::InvalidTransition(local_key.to_string()));
        }

        record.status = ReviewStatus::Completed;
        record.completed_at = Some(Utc::now());
        let record = record.clone();

        self.store.save(&snapshot)?;
        info!(key = local_key, "Review completed");
        Ok(record)
    }

    pub fn get(&self, local_key: &str) -> Option<ReviewRecord> {
        self.store.load().reviews.remove(local_key)
    }

    /// Every record regardless of status.
    pub fn all(&self) -> BTreeMap<String, ReviewRecord> {
        self.store.load().reviews
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn memory_ledger() -> Ledger {
        Ledger::new(MemoryStore::new())
    }

    #[test]
    fn test_record_submission_is_pending() {
        let ledger = memory_ledger();
        let record = ledger
            .record_submission("notes.md", "/remote/notes_1.pdf", PathBuf::from("/w/notes.md"))
            .unwrap();
        assert_eq!(record.status, ReviewStatus::Pending);

        let pending = ledger.list_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending["notes.md"].device_path, "/remote/notes_1.pdf");
    }

    #[test]
    fn test_resubmission_overwrites_instead_of_duplicating() {
        let ledger = memory_ledger();
        ledger
            .record_submission("notes.md", "/remote/notes_1.pdf", PathBuf::from("/w/notes.md"))
            .unwrap();
        ledger
            .record_submission("notes.md", "/remote/notes_2.pdf", PathBuf::from("/w/notes.md"))
            .unwrap();

        let all = ledger.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all["notes.md"].device_path, "/remote/notes_2.pdf");
    }

    #[test]
    fn test_resubmission_resets_completed_record_to_pending() {
        let ledger = memory_ledger();
        ledger
            .record_submission("notes.md", "/remote/notes_1.pdf", PathBuf::from("/w/notes.md"))
            .unwrap();
        ledger.mark_completed("notes.md").unwrap();
        ledger
            .record_submission("notes.md", "/remote/notes_2.pdf", PathBuf::from("/w/notes.md"))
            .unwrap();

        let record = ledger.get("notes.md").unwrap();
        assert!(record.is_pending());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_mark_completed_removes_from_pending() {
        let ledger = memory_ledger();
        ledger
            .record_submission("a.md", "/remote/a_1.pdf", PathBuf::from("/w/a.md"))
            .unwrap();
        ledger
            .record_submission("b.md", "/remote/b_1.pdf", PathBuf::from("/w/b.md"))
            .unwrap();

        let completed = ledger.mark_completed("a.md").unwrap();
        assert_eq!(completed.status, ReviewStatus::Completed);
        assert!(completed.completed_at.is_some());

        let pending = ledger.list_pending();
        assert_eq!(pending.keys().collect::<Vec<_>>(), vec!["b.md"]);

        let all = ledger.all();
        assert_eq!(all["a.md"].status, ReviewStatus::Completed);
        assert!(all["b.md"].completed_at.is_none());
    }

    #[test]
    fn test_mark_completed_unknown_key_is_not_found() {
        let ledger = memory_ledger();
        let err = ledger.mark_completed("missing.md").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(ref k) if k == "missing.md"));
    }

    #[test]
    fn test_mark_completed_twice_is_rejected_and_keeps_timestamp() {
        let ledger = memory_ledger();
        ledger
            .record_submission("a.md", "/remote/a_1.pdf", PathBuf::from("/w/a.md"))
            .unwrap();
        let first = ledger.mark_completed("a.md").unwrap();

        let err = ledger.mark_completed("a.md").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransition(_)));
        assert_eq!(ledger.get("a.md").unwrap().completed_at, first.completed_at);
    }

    #[test]
    fn test_ledger_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".manta/state.json");

        {
            let ledger = Ledger::open(&path);
            ledger
                .record_submission("a.md", "/remote/a_1.pdf", dir.path().join("a.md"))
                .unwrap();
            ledger
                .record_submission("b.md", "/remote/b_1.pdf", dir.path().join("b.md"))
                .unwrap();
            ledger.mark_completed("b.md").unwrap();
        }

        {
            let ledger = Ledger::open(&path);
            let pending = ledger.list_pending();
            assert_eq!(pending.len(), 1);
            assert!(pending.contains_key("a.md"));
            assert_eq!(ledger.all().len(), 2);
        }
    }

    #[test]
    fn test_completed_at_iff_completed() {
        let ledger = memory_ledger();
        for key in ["a.md", "b.md", "c.md"] {
            ledger
                .record_submission(key, "/remote/x_1.pdf", PathBuf::from("/w").join(key))
                .unwrap();
        }
        ledger.mark_completed("b.md").unwrap();

        for record in ledger.all().values() {
            assert_eq!(
                record.completed_at.is_some(),
                record.status == ReviewStatus::Completed
            );
        }
    }
}
