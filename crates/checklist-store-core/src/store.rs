use async_trait::async_trait;

use crate::document::Document;
use crate::error::StoreError;
use crate::version::VersionToken;

/// A document together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: Document,
    pub version: VersionToken,
}

/// Conflict-detected access to a single versioned JSON document.
///
/// Implementations never retry and never write without checking the
/// version precondition. Overlapping `save` calls from one process are not
/// serialized here; `SyncSession` does that.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the backend identifier (e.g., "github", "local", "memory").
    fn backend_name(&self) -> &'static str;

    /// Read the current document and its version.
    ///
    /// `Ok(None)` means the store has not been initialized yet.
    async fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Write `document` as the new content.
    ///
    /// - `expected = None`: create; fails with `Conflict` if a document
    ///   already exists.
    /// - `expected = Some(token)`: update; fails with `Conflict` unless
    ///   `token` is the current version.
    ///
    /// The new version is not returned; call `load` to obtain it.
    async fn save(
        &self,
        document: &Document,
        expected: Option<&VersionToken>,
        description: &str,
    ) -> Result<(), StoreError>;
}

/// Check a write precondition against the version currently stored.
///
/// Shared by the stores that enforce compare-and-swap themselves.
pub fn check_precondition(
    current: Option<&VersionToken>,
    expected: Option<&VersionToken>,
) -> Result<(), StoreError> {
    match (current, expected) {
        (None, None) => Ok(()),
        (Some(current), None) => Err(StoreError::Conflict(format!(
            "Document already exists at version {}",
            current
        ))),
        (None, Some(expected)) => Err(StoreError::Conflict(format!(
            "Expected version {} but no document exists",
            expected
        ))),
        (Some(current), Some(expected)) if current == expected => Ok(()),
        (Some(current), Some(expected)) => Err(StoreError::Conflict(format!(
            "Expected version {} but current is {}",
            expected, current
        ))),
    }
}
