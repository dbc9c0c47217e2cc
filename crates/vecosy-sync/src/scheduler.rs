use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vecosy_catalog::{detect_changes, VersionCatalog};
use vecosy_store::{FetchOutcome, ObjectStoreAdapter, StoreError};
use vecosy_types::ChangeEvent;

use crate::error::{SyncError, SyncResult};
use crate::notifier::{ChangeNotifier, ErrorListener};

/// What one fetch did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchReport {
    pub outcome: FetchOutcome,
    /// Whether a new catalog generation was published.
    pub published: bool,
    /// Changes dispatched after publication.
    pub events: Vec<ChangeEvent>,
}

struct FetchCore {
    store: Arc<dyn ObjectStoreAdapter>,
    catalog: Arc<ArcSwap<VersionCatalog>>,
    notifier: Arc<ChangeNotifier>,
    /// Serializes fetch, rebuild, diff, swap and dispatch.
    fetch_lock: tokio::sync::Mutex<()>,
    last_fetch: RwLock<Option<DateTime<Utc>>>,
    error_listeners: RwLock<Vec<ErrorListener>>,
}

impl FetchCore {
    async fn load(&self) -> SyncResult<usize> {
        let _guard = self.fetch_lock.lock().await;
        let references = self.store.list_references().await?;
        let catalog = VersionCatalog::build(&references);
        let applications = catalog.len();
        self.catalog.store(Arc::new(catalog));
        info!(references = references.len(), applications, "catalog loaded");
        Ok(applications)
    }

    async fn fetch(&self) -> SyncResult<FetchReport> {
        let _guard = self.fetch_lock.lock().await;
        debug!("fetching upstream");
        let outcome = match self.store.fetch().await {
            Ok(outcome) => outcome,
            Err(StoreError::NoRemote) => {
                warn!("cannot fetch: no remote configured");
                FetchOutcome::AlreadyUpToDate
            }
            Err(e) => return Err(SyncError::FetchFailed(e)),
        };

        let mut report = FetchReport {
            outcome,
            published: false,
            events: Vec::new(),
        };
        match outcome {
            FetchOutcome::AlreadyUpToDate => debug!("already up to date"),
            FetchOutcome::Updated => {
                let references = self.store.list_references().await?;
                let next = VersionCatalog::build(&references);
                let current = self.catalog.load_full();
                if *current != next {
                    report.events = detect_changes(&current, &next);
                    self.catalog.store(Arc::new(next));
                    report.published = true;
                    info!(changes = report.events.len(), "published new catalog");
                } else {
                    debug!("fetch brought no catalog changes");
                }
            }
        }

        *self.last_fetch.write() = Some(Utc::now());
        self.notifier.notify(&report.events);
        Ok(report)
    }

    fn report_error(&self, err: &SyncError) {
        error!(error = %err, "scheduled fetch failed");
        let listeners: Vec<ErrorListener> = self.error_listeners.read().clone();
        for listener in &listeners {
            listener(err);
        }
    }
}

struct PeriodicTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs fetches against the upstream, on demand and periodically.
///
/// Manual and scheduled fetches share one critical section around
/// fetch, rebuild, diff, swap and dispatch, so readers only ever observe
/// fully built catalog generations and watchers are notified only after the
/// generation they are told about is published.
pub struct FetchScheduler {
    core: Arc<FetchCore>,
    task: Mutex<Option<PeriodicTask>>,
}

impl FetchScheduler {
    pub fn new(
        store: Arc<dyn ObjectStoreAdapter>,
        catalog: Arc<ArcSwap<VersionCatalog>>,
        notifier: Arc<ChangeNotifier>,
    ) -> Self {
        Self {
            core: Arc::new(FetchCore {
                store,
                catalog,
                notifier,
                fetch_lock: tokio::sync::Mutex::new(()),
                last_fetch: RwLock::new(None),
                error_listeners: RwLock::new(Vec::new()),
            }),
            task: Mutex::new(None),
        }
    }

    /// Build and publish the catalog from the current references, without
    /// fetching and without dispatching events. Returns the number of
    /// applications.
    pub async fn load(&self) -> SyncResult<usize> {
        self.core.load().await
    }

    /// Fetch now. Failures are returned to the caller.
    pub async fn fetch_now(&self) -> SyncResult<FetchReport> {
        self.core.fetch().await
    }

    /// Start fetching every `interval`, the first fetch one interval from now.
    ///
    /// Failures go to the error listeners and the next tick retries.
    pub fn start_fetching_every(&self, interval: Duration) -> SyncResult<()> {
        if interval.is_zero() {
            return Err(SyncError::InvalidInterval);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| SyncError::NoRuntime(e.to_string()))?;

        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return Err(SyncError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let core = Arc::clone(&self.core);
        let token = cancel.clone();
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "periodic fetching started");
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = core.fetch().await {
                            core.report_error(&e);
                        }
                    }
                }
            }
            info!("periodic fetching stopped");
        });

        *slot = Some(PeriodicTask { cancel, handle });
        Ok(())
    }

    /// Stop periodic fetching and wait for the task to exit. A fetch already
    /// in progress completes first; no tick runs afterwards. Returns `false`
    /// if nothing was running.
    pub async fn stop_fetching(&self) -> bool {
        let Some(task) = self.task.lock().take() else {
            return false;
        };
        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            error!(error = %e, "periodic fetch task ended abnormally");
        }
        true
    }

    pub fn is_fetching(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Completion time of the last successful fetch.
    pub fn last_fetch_time(&self) -> Option<DateTime<Utc>> {
        *self.core.last_fetch.read()
    }

    pub fn add_error_listener<F>(&self, listener: F)
    where
        F: Fn(&SyncError) + Send + Sync + 'static,
    {
        self.core.error_listeners.write().push(Arc::new(listener));
    }

    /// The currently published catalog.
    pub fn catalog(&self) -> Arc<VersionCatalog> {
        self.core.catalog.load_full()
    }
}

impl Drop for FetchScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for FetchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchScheduler")
            .field("fetching", &self.is_fetching())
            .field("last_fetch", &self.last_fetch_time())
            .finish()
    }
}
