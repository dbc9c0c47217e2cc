use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use vecosy_auth::{KeyCache, TokenVerifier};
use vecosy_catalog::{SnapshotResolver, VersionCatalog, VersionEntry};
use vecosy_merge::{
    ConfigMergeEngine, Document, MergeStrategy, PropertySource, SmartConfigStrategy,
    SpringStrategy,
};
use vecosy_store::ObjectStoreAdapter;
use vecosy_sync::{
    ChangeNotifier, FetchReport, FetchScheduler, PumpExit, Subscription, SubscriptionId,
    SyncError, WatchPump, WatchRegistry, WatchSink,
};
use vecosy_types::{ApplicationVersion, ChangeEvent, SemanticVersion, SnapshotFile};

use crate::config::RepoConfig;
use crate::error::RepoResult;

/// A versioned configuration repository over one object store.
///
/// Every request-facing method validates the application name and version
/// before touching the store. Reads work on whichever catalog generation is
/// published when they start.
pub struct ConfigRepo {
    config: RepoConfig,
    resolver: Arc<SnapshotResolver>,
    scheduler: FetchScheduler,
    notifier: Arc<ChangeNotifier>,
    registry: Arc<WatchRegistry>,
    merger: ConfigMergeEngine,
    verifier: TokenVerifier,
}

impl ConfigRepo {
    /// Wire a repository over `store`. The catalog stays empty until
    /// [`ConfigRepo::init`].
    pub fn new(store: Arc<dyn ObjectStoreAdapter>, config: RepoConfig) -> RepoResult<Self> {
        config.validate()?;

        let catalog = Arc::new(ArcSwap::from_pointee(VersionCatalog::empty()));
        let resolver = Arc::new(SnapshotResolver::with_catalog(
            Arc::clone(&store),
            Arc::clone(&catalog),
        ));
        let registry = Arc::new(WatchRegistry::new());
        let notifier = Arc::new(ChangeNotifier::new(Arc::clone(&registry)));
        let scheduler = FetchScheduler::new(store, catalog, Arc::clone(&notifier));

        let keys = Arc::new(KeyCache::with_key_path(
            resolver.clone(),
            config.cache_capacity()?,
            config.public_key_path.clone(),
        ));
        {
            let keys = Arc::clone(&keys);
            notifier.add_handler(move |event| {
                keys.invalidate_app(&event.application);
            });
        }

        Ok(Self {
            merger: ConfigMergeEngine::new(resolver.clone()),
            verifier: TokenVerifier::new(config.security_enabled, keys),
            config,
            resolver,
            scheduler,
            notifier,
            registry,
        })
    }

    /// First catalog build. Starts periodic fetching when an interval is
    /// configured.
    pub async fn init(&self) -> RepoResult<()> {
        let applications = self.scheduler.load().await?;
        info!(applications, security = self.config.security_enabled, "repository initialized");
        if let Some(interval) = self.config.fetch_interval() {
            self.scheduler.start_fetching_every(interval)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// The currently published catalog generation.
    pub fn catalog(&self) -> Arc<VersionCatalog> {
        self.resolver.catalog()
    }

    /// Application name to its versions, newest first.
    pub fn apps_versions(&self) -> BTreeMap<String, Vec<String>> {
        self.resolver.catalog().apps_versions()
    }

    /// The catalog entry `(app, version)` resolves to.
    pub fn resolve(&self, app: &str, version: &str) -> RepoResult<VersionEntry> {
        let requested = validate(app, version)?;
        Ok(self.resolver.resolve(app, &requested)?)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_file(&self, app: &str, version: &str, path: &str) -> RepoResult<SnapshotFile> {
        let requested = validate(app, version)?;
        Ok(self.resolver.get_file(app, &requested, path).await?)
    }

    /// Merge the configuration of `(app, version)` for `profiles`.
    #[instrument(skip(self, strategy), fields(strategy = strategy.name()), level = "debug")]
    pub async fn merge_config(
        &self,
        app: &str,
        version: &str,
        profiles: &[String],
        strategy: &dyn MergeStrategy,
    ) -> RepoResult<Document> {
        let requested = validate(app, version)?;
        Ok(self.merger.merge(app, &requested, profiles, strategy).await?)
    }

    /// `config.{ext}` plus `{profile}/config.{ext}` overlays.
    pub fn smart_config_strategy(&self) -> SmartConfigStrategy {
        SmartConfigStrategy::with_extension(self.config.merge_extension.clone())
    }

    /// Spring naming, common files merged first.
    pub fn spring_strategy(&self) -> SpringStrategy {
        SpringStrategy::with_extension(true, self.config.merge_extension.clone())
    }

    /// Spring property sources, most specific first.
    pub async fn property_sources(
        &self,
        app: &str,
        version: &str,
        profiles: &[String],
    ) -> RepoResult<Vec<PropertySource>> {
        let requested = validate(app, version)?;
        let strategy = SpringStrategy::with_extension(false, self.config.merge_extension.clone());
        Ok(self
            .merger
            .property_sources(app, &requested, profiles, &strategy)
            .await?)
    }

    /// Fetch from upstream now.
    pub async fn fetch(&self) -> RepoResult<FetchReport> {
        Ok(self.scheduler.fetch_now().await?)
    }

    pub fn start_fetching_every(&self, interval: Duration) -> RepoResult<()> {
        Ok(self.scheduler.start_fetching_every(interval)?)
    }

    /// Stop periodic fetching and wait for the task to exit.
    pub async fn stop_fetching(&self) -> bool {
        self.scheduler.stop_fetching().await
    }

    pub fn is_fetching(&self) -> bool {
        self.scheduler.is_fetching()
    }

    pub fn last_fetch_time(&self) -> Option<DateTime<Utc>> {
        self.scheduler.last_fetch_time()
    }

    pub fn add_on_change_handler<F>(&self, handler: F)
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.add_handler(handler);
    }

    /// Receive failures of scheduled fetches.
    pub fn add_error_listener<F>(&self, listener: F)
    where
        F: Fn(&SyncError) + Send + Sync + 'static,
    {
        self.scheduler.add_error_listener(listener);
    }

    /// Register a watcher for changes to `app` at versions `>= min_version`.
    pub fn subscribe(&self, app: &str, min_version: &str) -> RepoResult<Subscription> {
        let min_version = validate(app, min_version)?;
        Ok(self.registry.register(app, min_version))
    }

    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.registry.unregister(id)
    }

    /// Subscribe and forward notifications to `sink` until `cancel` fires
    /// or the sink fails. The watcher is removed when this returns.
    pub async fn watch<S>(
        &self,
        app: &str,
        min_version: &str,
        cancel: CancellationToken,
        sink: &mut S,
    ) -> RepoResult<PumpExit>
    where
        S: WatchSink + ?Sized,
    {
        let subscription = self.subscribe(app, min_version)?;
        let pump = WatchPump::new(subscription, Arc::clone(&self.registry));
        Ok(pump.run(cancel, sink).await)
    }

    pub fn watcher_count(&self) -> usize {
        self.registry.len()
    }

    /// Check a request token for `(app, version)`.
    pub async fn verify_token(&self, app: &str, version: &str, token: Option<&str>) -> RepoResult<()> {
        let requested = validate(app, version)?;
        Ok(self.verifier.verify(app, &requested, token).await?)
    }
}

impl std::fmt::Debug for ConfigRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRepo")
            .field("config", &self.config)
            .field("applications", &self.resolver.catalog().len())
            .field("scheduler", &self.scheduler)
            .field("watchers", &self.registry.len())
            .finish()
    }
}

fn validate(app: &str, version: &str) -> RepoResult<SemanticVersion> {
    Ok(ApplicationVersion::new(app, version).validate()?)
}

#[cfg(test)]
mod tests {
    use vecosy_store::{InMemoryObjectStore, Snapshot};

    use super::*;
    use crate::error::{ErrorClass, RepoError};

    async fn repo() -> ConfigRepo {
        let store = Arc::new(InMemoryObjectStore::open());
        let id = store.commit(Snapshot::new().with_file("config.yml", "a: 1\n"));
        store.set_branch("app1/1.0.0", id).unwrap();
        let repo = ConfigRepo::new(store, RepoConfig::default()).unwrap();
        repo.init().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn invalid_requests_are_bad_requests() {
        let repo = repo().await;
        for (app, version) in [("", "1.0.0"), ("app/1", "1.0.0"), ("app1", "one")] {
            let err = repo.get_file(app, version, "config.yml").await.unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "{app}@{version}");
            assert_eq!(err.class(), ErrorClass::BadRequest);
        }
        assert!(repo.subscribe("app1", "x.y").is_err());
        assert_eq!(repo.watcher_count(), 0);
    }

    #[tokio::test]
    async fn init_without_interval_does_not_fetch_periodically() {
        let repo = repo().await;
        assert!(!repo.is_fetching());
        assert_eq!(repo.apps_versions()["app1"], vec!["1.0.0"]);
    }

    #[tokio::test]
    async fn fetch_without_remote_succeeds_without_changes() {
        let repo = repo().await;
        let report = repo.fetch().await.unwrap();
        assert!(report.events.is_empty());
        assert!(!report.published);
        assert!(repo.last_fetch_time().is_some());
        assert_eq!(repo.apps_versions()["app1"], vec!["1.0.0"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let store = Arc::new(InMemoryObjectStore::open());
        let config = RepoConfig {
            key_cache_capacity: 0,
            ..RepoConfig::default()
        };
        assert!(matches!(
            ConfigRepo::new(store, config),
            Err(RepoError::Config(_))
        ));
    }
}
