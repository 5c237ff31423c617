use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use checklist_store_core::{
    check_precondition, parse_document, serialize_document, Document, DocumentStore, Snapshot,
    StoreError, VersionToken,
};
use fs2::FileExt;
use tracing::{debug, instrument, warn};

/// Document store backed by one JSON file on disk.
///
/// The version token is the SHA-256 of the file's bytes. Writers take an
/// exclusive OS lock on `{file}.lock` for the whole check-and-replace, so
/// separate processes sharing the file get the same compare-and-swap
/// guarantee as remote clients. Replacement goes through a temp file and a
/// rename, so readers never see a partial document.
///
/// Layout:
/// ```text
/// {dir}/
///   db.json        # the document
///   db.json.lock   # writer lock (empty)
/// ```
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    path: PathBuf,
}

impl LocalFileStore {
    /// Create a store for the document at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Default document location under the platform data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("checklist-sync")
            .join("db.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Read the raw file, `None` if it does not exist.
    fn read_bytes(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Fetch(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn open_lock(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Write(format!("Failed to create dir {}: {}", parent.display(), e))
            })?;
        }

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::Write(format!("Failed to open lock file: {}", e)))?;

        // Blocks until any other writer is done.
        file.lock_exclusive().map_err(|e| {
            StoreError::Write(format!("Failed to lock {}: {}", lock_path.display(), e))
        })?;
        Ok(file)
    }

    fn replace(&self, text: &str) -> Result<(), StoreError> {
        let temp_path = self.temp_path();
        fs::write(&temp_path, text).map_err(|e| {
            StoreError::Write(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            StoreError::Write(format!("Failed to rename to {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalFileStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self), level = "debug", fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let Some(bytes) = self.read_bytes()? else {
            debug!("Document file {} does not exist", self.path.display());
            return Ok(None);
        };

        let version = VersionToken::for_content(&bytes);
        let text = String::from_utf8(bytes).map_err(|e| {
            StoreError::Decode(format!("{} is not valid UTF-8: {}", self.path.display(), e))
        })?;
        let document = parse_document(&text)?;

        debug!("Loaded {} ({} bytes) at {}", self.path.display(), text.len(), version);
        Ok(Some(Snapshot { document, version }))
    }

    #[instrument(skip(self, document), level = "debug", fields(path = %self.path.display()))]
    async fn save(
        &self,
        document: &Document,
        expected: Option<&VersionToken>,
        description: &str,
    ) -> Result<(), StoreError> {
        let text = serialize_document(document)?;
        let lock = self.open_lock()?;

        let current = self
            .read_bytes()?
            .map(|bytes| VersionToken::for_content(&bytes));
        if let Err(e) = check_precondition(current.as_ref(), expected) {
            warn!("Rejected write '{}' to {}: {}", description, self.path.display(), e);
            return Err(e);
        }

        self.replace(&text)?;
        debug!("Saved {} ({} bytes): {}", self.path.display(), text.len(), description);

        // Dropping the handle releases the lock; unlock explicitly to surface errors.
        FileExt::unlock(&lock)
            .map_err(|e| StoreError::Write(format!("Failed to unlock: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_store_core::{seed, Checklist, SyncSession};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (LocalFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path().join("data").join("db.json"));
        (store, temp_dir)
    }

    fn small_document(name: &str) -> Document {
        Document {
            checklists: vec![Checklist {
                id: "restroom".to_string(),
                name: name.to_string(),
                tasks: vec!["Refill soap dispensers.".to_string()],
                extra: Default::default(),
            }],
            submissions: vec![],
            reports: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let (store, _temp) = setup();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_update_and_stale_write() {
        let (store, _temp) = setup();
        store
            .save(&small_document("Restroom"), None, "Initial data seed")
            .await
            .unwrap();

        let first = store.load().await.unwrap().unwrap();
        assert_eq!(first.document, small_document("Restroom"));

        store
            .save(&small_document("Restrooms ✓"), Some(&first.version), "Rename")
            .await
            .unwrap();

        let err = store
            .save(&small_document("Stale"), Some(&first.version), "Stale rename")
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let current = store.load().await.unwrap().unwrap();
        assert_eq!(current.document, small_document("Restrooms ✓"));
        assert_ne!(current.version, first.version);
    }

    #[tokio::test]
    async fn test_create_over_existing_file_is_conflict() {
        let (store, _temp) = setup();
        store.save(&small_document("A"), None, "Seed A").await.unwrap();
        let err = store.save(&small_document("B"), None, "Seed B").await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.load().await.unwrap().unwrap().document, small_document("A"));
    }

    #[tokio::test]
    async fn test_version_tracks_external_edits() {
        let (store, _temp) = setup();
        store.save(&small_document("A"), None, "Seed").await.unwrap();
        let before = store.load().await.unwrap().unwrap();

        // Someone edits the file by hand.
        let edited = serialize_document(&small_document("Edited by hand")).unwrap();
        fs::write(store.path(), edited).unwrap();

        let err = store
            .save(&small_document("B"), Some(&before.version), "Update")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_decode_error() {
        let (store, _temp) = setup();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_session_seeds_file() {
        let (store, _temp) = setup();
        let store = Arc::new(store);
        let session = SyncSession::open(store.clone(), seed::initial_document())
            .await
            .unwrap();

        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains("\"Health Compliance\""));
        assert_eq!(session.snapshot().await, store.load().await.unwrap().unwrap());
    }
}
