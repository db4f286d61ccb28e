//! File-backed dedup store.
//!
//! The file is a JSON array of strings, oldest first. It is read once when
//! the store opens and rewritten in full after every new entry. Writes go to
//! a temp file in the same directory which is then renamed over the target,
//! so readers never see a half-written array.
//!
//! The in-memory set is updated synchronously. Inside a tokio runtime the
//! file write runs on the blocking pool; each snapshot carries a version and
//! an older snapshot never overwrites a newer one.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tod_core::{DedupSet, DedupStore};
use tracing::{debug, warn};

/// Default store location.
pub const DEDUP_PATH_DEFAULT: &str = "/tmp/generated_truth_or_dare.json";

/// Dedup store persisted as a JSON array.
pub struct FileDedupStore {
    writer: Arc<SnapshotWriter>,
    set: Mutex<VersionedSet>,
}

struct VersionedSet {
    set: DedupSet,
    version: u64,
}

/// Serializes file writes and drops stale snapshots.
struct SnapshotWriter {
    path: PathBuf,
    /// Version of the snapshot currently on disk
    written_version: Mutex<u64>,
}

impl FileDedupStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file also starts
    /// empty, with a warning; it is overwritten on the next add.
    pub fn open(path: impl Into<PathBuf>, entries_max: Option<usize>) -> Self {
        let path = path.into();

        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(StoreError::Io { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %path.display(), "No dedup file yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unusable dedup file");
                Vec::new()
            }
        };

        let set = DedupSet::from_entries(entries, entries_max);
        debug!(path = %path.display(), entries = set.len(), "Dedup store opened");

        Self {
            writer: Arc::new(SnapshotWriter {
                path,
                written_version: Mutex::new(0),
            }),
            set: Mutex::new(VersionedSet { set, version: 0 }),
        }
    }

    /// Read the entries stored at `path`.
    pub fn load(path: &Path) -> Result<Vec<String>, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.writer.path
    }
}

impl SnapshotWriter {
    /// Write `entries` unless a newer snapshot is already on disk.
    fn write(&self, version: u64, entries: &[String]) {
        let mut written = self
            .written_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if version <= *written {
            debug!(version, written = *written, "Skipping stale dedup snapshot");
            return;
        }

        match self.persist(entries) {
            Ok(()) => *written = version,
            Err(e) => warn!(error = %e, "Failed to persist dedup store"),
        }
    }

    /// Rewrite the file from `entries`.
    fn persist(&self, entries: &[String]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        temp.write_all(&json).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(())
    }
}

impl DedupStore for FileDedupStore {
    fn contains(&self, text: &str) -> bool {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set
            .contains(text)
    }

    fn add(&self, text: String) {
        let (version, entries) = {
            let mut guard = self.set.lock().unwrap_or_else(PoisonError::into_inner);
            if !guard.set.insert(text) {
                return;
            }
            guard.version += 1;
            let entries: Vec<String> = guard.set.entries().cloned().collect();
            (guard.version, entries)
        };

        let writer = Arc::clone(&self.writer);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || writer.write(version, &entries));
            }
            Err(_) => writer.write(version, &entries),
        }
    }

    fn len(&self) -> usize {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set
            .len()
    }
}

/// Dedup file errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Dedup file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Dedup file {path} is not a JSON string array: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDedupStore::open(dir.path().join("seen.json"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");

        let store = FileDedupStore::open(&path, None);
        store.add("מה אתה אוהב?".to_string());
        store.add("תן לי חיבוק".to_string());
        store.add("מה אתה אוהב?".to_string());
        assert_eq!(store.len(), 2);

        let on_disk = FileDedupStore::load(&path).unwrap();
        assert_eq!(on_disk, vec!["מה אתה אוהב?", "תן לי חיבוק"]);

        let reopened = FileDedupStore::open(&path, None);
        assert!(reopened.contains("תן לי חיבוק"));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_corrupt_file_starts_empty_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileDedupStore::open(&path, None);
        assert!(store.is_empty());

        store.add("שלום".to_string());
        assert_eq!(FileDedupStore::load(&path).unwrap(), vec!["שלום"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");

        let store = FileDedupStore::open(&path, Some(2));
        for text in ["a", "b", "c"] {
            store.add(text.to_string());
        }

        assert!(!store.contains("a"));
        assert_eq!(FileDedupStore::load(&path).unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_stale_snapshot_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDedupStore::open(dir.path().join("seen.json"), None);
        let newer = vec!["a".to_string(), "b".to_string()];
        let older = vec!["a".to_string()];

        store.writer.write(2, &newer);
        store.writer.write(1, &older);
        assert_eq!(FileDedupStore::load(store.path()).unwrap(), newer);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runtime_adds_persist_off_worker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        let store = FileDedupStore::open(&path, None);

        let texts: Vec<String> = (0..20).map(|i| format!("כרטיס {}", i)).collect();
        for text in &texts {
            store.add(text.clone());
        }
        // The set is current before any write lands.
        assert_eq!(store.len(), 20);
        assert!(store.contains("כרטיס 19"));

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            if FileDedupStore::load(&path).ok().as_ref() == Some(&texts) {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "dedup file never caught up");
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_unwritable_path_does_not_fail_add() {
        let store = FileDedupStore::open("/nonexistent-dir/seen.json", None);
        store.add("שלום".to_string());
        assert!(store.contains("שלום"));
    }
}
