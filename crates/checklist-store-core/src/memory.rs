use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::document::Document;
use crate::encoding::{decode_content, encode_content, parse_document, serialize_document};
use crate::error::StoreError;
use crate::store::{check_precondition, DocumentStore, Snapshot};
use crate::version::VersionToken;

#[derive(Debug, Default)]
struct MemoryState {
    /// Transport-encoded content and its version.
    current: Option<(String, VersionToken)>,
    /// Descriptions of accepted writes, oldest first.
    history: Vec<String>,
}

/// In-process document store.
///
/// Stores the encoded form so reads go through the same decode path as the
/// remote backend, and enforces the same version preconditions. Contents are
/// lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    /// Create an empty (uninitialized) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `document`.
    pub fn with_document(document: &Document) -> Result<Self, StoreError> {
        let text = serialize_document(document)?;
        let version = VersionToken::for_content(text.as_bytes());
        Ok(Self {
            state: Mutex::new(MemoryState {
                current: Some((encode_content(&text), version)),
                history: Vec::new(),
            }),
        })
    }

    /// Descriptions of every accepted write, oldest first.
    pub async fn history(&self) -> Vec<String> {
        self.state.lock().await.history.clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self), level = "debug")]
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let state = self.state.lock().await;
        let Some((encoded, version)) = state.current.as_ref() else {
            debug!("In-memory document not initialized");
            return Ok(None);
        };

        let document = parse_document(&decode_content(encoded)?)?;
        Ok(Some(Snapshot {
            document,
            version: version.clone(),
        }))
    }

    #[instrument(skip(self, document), level = "debug")]
    async fn save(
        &self,
        document: &Document,
        expected: Option<&VersionToken>,
        description: &str,
    ) -> Result<(), StoreError> {
        let text = serialize_document(document)?;
        let mut state = self.state.lock().await;

        if let Err(e) = check_precondition(state.current.as_ref().map(|(_, v)| v), expected) {
            warn!("Rejected in-memory write '{}': {}", description, e);
            return Err(e);
        }

        let version = VersionToken::for_content(text.as_bytes());
        debug!("In-memory write '{}' -> {}", description, version);
        state.current = Some((encode_content(&text), version));
        state.history.push(description.to_string());
        Ok(())
    }
}
