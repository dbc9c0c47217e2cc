use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use vecosy_types::ChangeEvent;

use crate::error::SyncError;
use crate::watch::WatchRegistry;

/// Callback invoked for every dispatched change.
pub type ChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Callback invoked for every failure of a detached (scheduled) fetch.
pub type ErrorListener = Arc<dyn Fn(&SyncError) + Send + Sync>;

/// Turns catalog deltas into callbacks and watcher notifications.
pub struct ChangeNotifier {
    handlers: RwLock<Vec<ChangeHandler>>,
    registry: Arc<WatchRegistry>,
}

impl ChangeNotifier {
    pub fn new(registry: Arc<WatchRegistry>) -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.registry
    }

    pub fn add_handler<F>(&self, handler: F)
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push(Arc::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Dispatch `events` in order: handlers first, then watchers.
    pub fn notify(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        // Handlers may register further handlers; call them outside the lock.
        let handlers: Vec<ChangeHandler> = self.handlers.read().clone();
        for event in events {
            for handler in &handlers {
                handler(event);
            }
            let notified = self.registry.dispatch(event);
            info!(change = %event, watchers = notified, "change dispatched");
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("handlers", &self.handler_count())
            .field("watchers", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use vecosy_types::SemanticVersion;

    use super::*;

    #[test]
    fn handlers_and_watchers_receive_events() {
        let registry = Arc::new(WatchRegistry::new());
        let notifier = ChangeNotifier::new(Arc::clone(&registry));
        let seen = Arc::new(AtomicUsize::new(0));
        {
            let seen = Arc::clone(&seen);
            notifier.add_handler(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }
        let mut sub = registry.register("app1", SemanticVersion::parse("1.0.0").unwrap());

        notifier.notify(&[
            ChangeEvent::new("app1", "1.0.0"),
            ChangeEvent::new("app2", "1.0.0"),
        ]);

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(sub.receiver.try_recv().unwrap(), ChangeEvent::new("app1", "1.0.0"));
        assert!(sub.receiver.try_recv().is_err());
    }

    #[test]
    fn handler_may_register_another_handler() {
        let notifier = Arc::new(ChangeNotifier::new(Arc::new(WatchRegistry::new())));
        {
            let inner = Arc::clone(&notifier);
            notifier.add_handler(move |_| inner.add_handler(|_| {}));
        }
        notifier.notify(&[ChangeEvent::new("app1", "1.0.0")]);
        assert_eq!(notifier.handler_count(), 2);
    }
}
