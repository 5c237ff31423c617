use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::document::Document;
use crate::error::StoreError;
use crate::store::{DocumentStore, Snapshot};

/// Change description used when seeding an uninitialized store.
pub const SEED_DESCRIPTION: &str = "Initial data seed";

/// Read-modify-write discipline over a `DocumentStore`.
///
/// Holds the last authoritative snapshot (what the store returned on the
/// most recent `load`). Every write starts from that snapshot, carries its
/// version as the precondition and ends with a fresh `load`, whether the
/// write succeeded or not. The snapshot lock is held across the whole
/// cycle, so at most one write is in flight per session.
pub struct SyncSession {
    store: Arc<dyn DocumentStore>,
    current: Mutex<Snapshot>,
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("backend", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}

impl SyncSession {
    /// Load the document, seeding the store with `seed` if it is empty.
    ///
    /// After seeding, the document is always loaded again: another client
    /// may have seeded concurrently and its content wins.
    #[instrument(skip(store, seed), fields(backend = store.backend_name()))]
    pub async fn open(store: Arc<dyn DocumentStore>, seed: Document) -> Result<Self, StoreError> {
        let snapshot = match store.load().await? {
            Some(snapshot) => snapshot,
            None => {
                info!("Store is uninitialized, writing seed document");
                match store.save(&seed, None, SEED_DESCRIPTION).await {
                    Ok(()) => {}
                    Err(StoreError::Conflict(msg)) => {
                        warn!("Another client seeded the store first: {}", msg);
                    }
                    Err(e) => return Err(e),
                }
                store.load().await?.ok_or_else(|| {
                    StoreError::Fetch("Document still missing after seeding".to_string())
                })?
            }
        };

        debug!("Opened session at version {}", snapshot.version);
        Ok(Self {
            store,
            current: Mutex::new(snapshot),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// The last authoritative snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        self.current.lock().await.clone()
    }

    /// Replace the authoritative snapshot with the store's current state.
    #[instrument(skip(self), level = "debug")]
    pub async fn refresh(&self) -> Result<Snapshot, StoreError> {
        let mut current = self.current.lock().await;
        *current = self.reload().await?;
        Ok(current.clone())
    }

    async fn reload(&self) -> Result<Snapshot, StoreError> {
        self.store
            .load()
            .await?
            .ok_or_else(|| StoreError::Fetch("Document disappeared from the store".to_string()))
    }

    /// Apply `edit` to a copy of the authoritative document and write it
    /// back under the authoritative version.
    ///
    /// If `edit` fails nothing is written. If the write fails (including
    /// `Conflict`), the session reloads before returning the write error, so
    /// `snapshot()` reflects the store rather than the discarded draft. Once
    /// the write is accepted the call succeeds, even if the reload after it
    /// does not.
    #[instrument(skip(self, edit), level = "debug")]
    pub async fn apply<T, F>(&self, description: &str, edit: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Document) -> Result<T, StoreError>,
    {
        let mut current = self.current.lock().await;

        let mut draft = current.document.clone();
        let output = edit(&mut draft)?;

        if let Err(e) = self
            .store
            .save(&draft, Some(&current.version), description)
            .await
        {
            warn!("Write '{}' failed, reloading: {}", description, e);
            match self.reload().await {
                Ok(fresh) => *current = fresh,
                Err(reload_err) => warn!("Reload after failed write also failed: {}", reload_err),
            }
            return Err(e);
        }

        // The write is committed from here on. A failed reload keeps the old
        // snapshot; its token is stale, so the next write conflicts and reloads.
        match self.reload().await {
            Ok(fresh) => {
                *current = fresh;
                debug!("Committed '{}', now at version {}", description, current.version);
            }
            Err(e) => warn!("Committed '{}' but reloading failed: {}", description, e),
        }
        Ok(output)
    }

    /// Like `apply`, but re-runs `edit` against the reloaded document after
    /// each conflict, up to `attempts` tries in total.
    ///
    /// The edit is always replayed on fresh state; a draft built on a stale
    /// version is never resent.
    pub async fn apply_with_retry<T, F>(
        &self,
        description: &str,
        attempts: usize,
        mut edit: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut(&mut Document) -> Result<T, StoreError>,
    {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.apply(description, &mut edit).await {
                Err(StoreError::Conflict(msg)) if attempt < attempts => {
                    info!(
                        "Conflict on '{}' (attempt {}/{}), replaying on fresh state: {}",
                        description, attempt, attempts, msg
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
