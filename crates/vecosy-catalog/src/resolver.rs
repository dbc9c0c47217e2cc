use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::debug;
use vecosy_store::{ObjectStoreAdapter, StoreError};
use vecosy_types::{SemanticVersion, SnapshotFile};

use crate::catalog::{VersionCatalog, VersionEntry};
use crate::error::{ResolveError, ResolveResult};

/// Read access to resolved snapshot files.
///
/// The merge engine and the key cache read through this seam rather than
/// the resolver itself.
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    /// Resolve `(app, requested)` and read `path` from the resolved snapshot.
    async fn read_file(
        &self,
        app: &str,
        requested: &SemanticVersion,
        path: &str,
    ) -> ResolveResult<SnapshotFile>;
}

/// Nearest-version resolution over the currently published catalog.
///
/// The catalog handle is shared with whoever publishes new generations; each
/// call loads one generation and works on it to completion.
#[derive(Clone)]
pub struct SnapshotResolver {
    catalog: Arc<ArcSwap<VersionCatalog>>,
    store: Arc<dyn ObjectStoreAdapter>,
}

impl SnapshotResolver {
    /// A resolver over an empty catalog.
    pub fn new(store: Arc<dyn ObjectStoreAdapter>) -> Self {
        Self::with_catalog(store, Arc::new(ArcSwap::from_pointee(VersionCatalog::empty())))
    }

    pub fn with_catalog(
        store: Arc<dyn ObjectStoreAdapter>,
        catalog: Arc<ArcSwap<VersionCatalog>>,
    ) -> Self {
        Self { catalog, store }
    }

    /// The currently published catalog generation.
    pub fn catalog(&self) -> Arc<VersionCatalog> {
        self.catalog.load_full()
    }

    /// The shared publication handle.
    pub fn catalog_handle(&self) -> &Arc<ArcSwap<VersionCatalog>> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn ObjectStoreAdapter> {
        &self.store
    }

    /// Find the newest version of `app` that does not exceed `requested`.
    pub fn resolve(&self, app: &str, requested: &SemanticVersion) -> ResolveResult<VersionEntry> {
        let catalog = self.catalog.load();
        let application = catalog
            .get(app)
            .ok_or_else(|| ResolveError::ApplicationNotFound(app.to_string()))?;
        let entry = application
            .nearest(requested)
            .ok_or_else(|| ResolveError::NoMatchingVersion {
                application: app.to_string(),
                requested: requested.to_string(),
            })?;
        debug!(app, requested = %requested, resolved = %entry.version, "resolved version");
        Ok(entry.clone())
    }

    /// Resolve, then read `path` from the resolved snapshot.
    ///
    /// The returned file's `version` is the snapshot identity, so two
    /// requested versions resolving to identical content report the same
    /// version.
    pub async fn get_file(
        &self,
        app: &str,
        requested: &SemanticVersion,
        path: &str,
    ) -> ResolveResult<SnapshotFile> {
        let entry = self.resolve(app, requested)?;
        let content = self
            .store
            .read_file(&entry.reference, path)
            .await
            .map_err(|e| match e {
                StoreError::FileNotFound { .. } => ResolveError::FileNotFound {
                    application: app.to_string(),
                    version: entry.version.to_string(),
                    path: path.to_string(),
                },
                other => ResolveError::Store(other),
            })?;
        let identity = self.store.resolve_commit_identity(&entry.reference).await?;
        Ok(SnapshotFile::new(identity.to_hex(), content))
    }
}

#[async_trait]
impl SnapshotReader for SnapshotResolver {
    async fn read_file(
        &self,
        app: &str,
        requested: &SemanticVersion,
        path: &str,
    ) -> ResolveResult<SnapshotFile> {
        self.get_file(app, requested, path).await
    }
}

impl std::fmt::Debug for SnapshotResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotResolver")
            .field("applications", &self.catalog.load().len())
            .finish()
    }
}
