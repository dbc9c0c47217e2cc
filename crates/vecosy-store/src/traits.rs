use async_trait::async_trait;
use vecosy_refs::Reference;
use vecosy_types::ObjectId;

use crate::error::StoreResult;

/// What a fetch brought in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// At least one reference was created, moved or removed.
    Updated,
    /// Nothing changed upstream.
    AlreadyUpToDate,
}

impl FetchOutcome {
    pub fn is_updated(self) -> bool {
        self == FetchOutcome::Updated
    }
}

/// Read access to a version-controlled configuration history.
///
/// All implementations must satisfy these invariants:
/// - `list_references` returns every branch, remote-tracking branch and tag,
///   sorted by canonical name.
/// - `fetch` treats "already up to date" as success.
/// - `read_file` and `resolve_commit_identity` read the snapshot the
///   reference's `target` names, not whatever the ref points at now.
#[async_trait]
pub trait ObjectStoreAdapter: Send + Sync {
    /// List all references in the branch, remote and tag namespaces.
    async fn list_references(&self) -> StoreResult<Vec<Reference>>;

    /// Update remote-tracking references from the upstream.
    async fn fetch(&self) -> StoreResult<FetchOutcome>;

    /// Read `path` from the snapshot `reference` points at.
    ///
    /// Returns `StoreError::FileNotFound` if the path does not exist.
    async fn read_file(&self, reference: &Reference, path: &str) -> StoreResult<Vec<u8>>;

    /// The content identity of the snapshot `reference` points at.
    async fn resolve_commit_identity(&self, reference: &Reference) -> StoreResult<ObjectId>;
}
