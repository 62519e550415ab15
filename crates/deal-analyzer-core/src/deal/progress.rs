//! Durable storage for the in-progress wizard draft.
//!
//! A single string-keyed blob ([`PROGRESS_KEY`]) holds the accumulated
//! [`DealDraft`] as JSON. It is written after every step edit and removed
//! after a successful analysis or an explicit reset.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::draft::DealDraft;
use crate::DealResult;

/// Key under which the draft is persisted.
pub const PROGRESS_KEY: &str = "dealInputProgress";

/// Storage for the single in-progress draft.
pub trait ProgressStore {
    /// The saved draft, or `None` when nothing usable is stored.
    /// Unreadable or malformed blobs are treated as absent.
    fn load(&self) -> Option<DealDraft>;

    fn save(&self, draft: &DealDraft) -> DealResult<()>;

    fn clear(&self) -> DealResult<()>;
}

/// Progress store backed by `<dir>/dealInputProgress.json`.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        FileProgressStore {
            path: dir.as_ref().join(format!("{PROGRESS_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Option<DealDraft> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read saved progress");
                return None;
            }
        };

        match serde_json::from_str::<DealDraft>(&contents) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed saved progress");
                None
            }
        }
    }

    fn save(&self, draft: &DealDraft) -> DealResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(draft)?;
        // write-then-rename so a crash never leaves a half-written blob
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved deal progress");
        Ok(())
    }

    fn clear(&self) -> DealResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared deal progress");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::model::PropertyType;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_draft() -> DealDraft {
        DealDraft {
            property_type: Some(PropertyType::Multifamily),
            purchase_price: Some(dec!(1200000)),
            number_of_units: Some(8),
            vacancy_rate: Some(dec!(6)),
            ..DealDraft::default()
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::new(dir.path());
        store.save(&sample_draft()).unwrap();
        assert_eq!(store.load(), Some(sample_draft()));
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::new(dir.path());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_malformed_blob_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_removes_blob_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::new(dir.path());
        store.save(&sample_draft()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_save_creates_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::new(dir.path().join("nested").join("state"));
        store.save(&sample_draft()).unwrap();
        assert!(store.path().exists());
    }
}
