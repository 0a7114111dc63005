//! File-backed user record store.
//!
//! All records live in one JSON document (`{"users": [...]}`). Every write
//! rewrites the whole document, so every read-merge-write cycle runs under a
//! single store-wide lock.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// A persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub display_name: Option<String>,
    pub resolved_attribute: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// On-disk envelope.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    users: Vec<UserRecord>,
}

/// Durable key-value store of [`UserRecord`]s keyed by `user_id`.
pub struct UserRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the backing file exists and parses.
    ///
    /// A missing file is created empty; a corrupt one is reset to empty.
    /// Returns the number of records currently stored.
    pub async fn initialize(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;

        match self.read_file().await? {
            Some(Ok(file)) => Ok(file.users.len()),
            Some(Err(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Record file corrupt, reinitializing: {e}"
                );
                self.write_file(&RecordFile::default()).await?;
                Ok(0)
            }
            None => {
                tracing::info!(path = %self.path.display(), "Creating record file");
                self.write_file(&RecordFile::default()).await?;
                Ok(0)
            }
        }
    }

    /// Insert or update the record for `user_id`.
    ///
    /// `Some` fields overwrite the stored value, `None` fields leave it as is.
    /// `last_updated` is always refreshed.
    pub async fn upsert(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        resolved_attribute: Option<&str>,
    ) -> Result<UserRecord, StoreError> {
        let _guard = self.lock.lock().await;

        let mut file = self.load_or_empty().await?;
        let now = Utc::now();

        let record = match file.users.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => {
                if let Some(name) = display_name {
                    existing.display_name = Some(name.to_string());
                }
                if let Some(attr) = resolved_attribute {
                    existing.resolved_attribute = Some(attr.to_string());
                }
                existing.last_updated = now;
                existing.clone()
            }
            None => {
                let record = UserRecord {
                    user_id: user_id.to_string(),
                    display_name: display_name.map(String::from),
                    resolved_attribute: resolved_attribute.map(String::from),
                    last_updated: now,
                };
                file.users.push(record.clone());
                record
            }
        };

        self.write_file(&file).await?;
        tracing::debug!(user_id = %user_id, total = file.users.len(), "User record saved");
        Ok(record)
    }

    /// Look up a single record.
    pub async fn get(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.load_or_empty().await?;
        Ok(file.users.into_iter().find(|r| r.user_id == user_id))
    }

    /// All stored records, in file order.
    pub async fn records(&self) -> Result<Vec<UserRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load_or_empty().await?.users)
    }

    // ── File helpers (caller holds the lock) ─────────────────────────

    /// Load the collection, treating a missing or corrupt file as empty.
    async fn load_or_empty(&self) -> Result<RecordFile, StoreError> {
        match self.read_file().await? {
            Some(Ok(file)) => Ok(file),
            Some(Err(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Record file corrupt, treating as empty: {e}"
                );
                Ok(RecordFile::default())
            }
            None => Ok(RecordFile::default()),
        }
    }

    /// `None` when the file does not exist; `Some(Err)` when it does not decode.
    async fn read_file(&self) -> Result<Option<Result<RecordFile, StoreError>>, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        // Raw bytes so invalid UTF-8 is a decode failure, not an IO one.
        Ok(Some(serde_json::from_slice(&raw).map_err(|source| {
            StoreError::Decode {
                path: self.path.display().to_string(),
                source,
            }
        })))
    }

    /// Rewrite the whole collection via a temp file and rename.
    async fn write_file(&self, file: &RecordFile) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(file).map_err(StoreError::Encode)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(io_err)?;
        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (UserRecordStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = UserRecordStore::new(dir.path().join("user_data.json"));
        (store, dir)
    }

    #[tokio::test]
    async fn initialize_creates_missing_file() {
        let (store, _dir) = test_store();
        assert!(!store.path().exists());

        let count = store.initialize().await.unwrap();
        assert_eq!(count, 0);
        assert!(store.path().exists());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["users"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn initialize_repairs_corrupt_file() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), "{ not json").unwrap();

        let count = store.initialize().await.unwrap();
        assert_eq!(count, 0);
        assert!(store.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initialize_repairs_file_with_invalid_utf8() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        assert_eq!(store.initialize().await.unwrap(), 0);
        assert!(store.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_reads_as_empty_and_accepts_upserts() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        assert!(store.get("1").await.unwrap().is_none());
        store.upsert("1", Some("alice"), Some("10.0.0.1")).await.unwrap();

        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "1");
    }

    #[tokio::test]
    async fn directory_at_data_path_is_an_io_error() {
        let (store, _dir) = test_store();
        std::fs::create_dir(store.path()).unwrap();

        let err = store.upsert("1", None, Some("10.0.0.1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "got: {err}");
        assert!(matches!(store.initialize().await, Err(StoreError::Io { .. })));
    }

    #[tokio::test]
    async fn initialize_counts_existing_records() {
        let (store, _dir) = test_store();
        store.upsert("1", Some("alice"), Some("10.0.0.1")).await.unwrap();
        store.upsert("2", Some("bob"), None).await.unwrap();

        assert_eq!(store.initialize().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_in_place() {
        let (store, _dir) = test_store();

        let first = store.upsert("42", Some("alice"), Some("1.1.1.1")).await.unwrap();
        let second = store.upsert("42", Some("alice"), Some("2.2.2.2")).await.unwrap();

        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resolved_attribute.as_deref(), Some("2.2.2.2"));
        assert!(second.last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn upsert_keeps_fields_not_provided() {
        let (store, _dir) = test_store();
        store.upsert("42", Some("alice"), Some("1.1.1.1")).await.unwrap();
        store.upsert("42", None, Some("3.3.3.3")).await.unwrap();

        let record = store.get("42").await.unwrap().unwrap();
        assert_eq!(record.display_name.as_deref(), Some("alice"));
        assert_eq!(record.resolved_attribute.as_deref(), Some("3.3.3.3"));
    }

    #[tokio::test]
    async fn upsert_over_corrupt_file_yields_single_record() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), "garbage").unwrap();

        assert!(store.records().await.unwrap().is_empty());
        store.upsert("7", Some("carol"), Some("8.8.8.8")).await.unwrap();

        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "7");
    }

    #[tokio::test]
    async fn upsert_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = UserRecordStore::new(dir.path().join("nested/deeper/users.json"));
        store.upsert("1", None, Some("1.2.3.4")).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn get_missing_user_returns_none() {
        let (store, _dir) = test_store();
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_upserts_never_drop_records() {
        let (store, _dir) = test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .upsert(&format!("user-{i}"), Some("name"), Some("10.0.0.1"))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 16);
    }
}
