//! Watch subscriptions.
//!
//! The [`WatchRegistry`] maps subscription ids to watchers. Each watcher is
//! bound to one application and a minimum version and owns a private
//! unbounded queue. Dispatch only ever does non-blocking sends. A watcher
//! whose consumer is gone is dropped from the registry by the next dispatch
//! that reaches it.
//!
//! A subscription's lifetime is bound to its consumer: the [`WatchPump`]
//! forwards queued notifications to a [`WatchSink`] until the caller's
//! cancellation token fires or the sink fails, and its [`SubscriptionGuard`]
//! unregisters the watcher when it drops.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;
use vecosy_types::{ChangeEvent, SemanticVersion};

use crate::error::{SyncError, SyncResult};

/// Identifier of one live subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// A fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Watcher {
    application: String,
    min_version: SemanticVersion,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// A newly registered subscription: its id and its delivery queue.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

/// Concurrent map of live watchers.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    watchers: DashMap<SubscriptionId, Watcher>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watcher for `application` at versions `>= min_version`.
    pub fn register(&self, application: &str, min_version: SemanticVersion) -> Subscription {
        let id = SubscriptionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(subscription = %id, application, min_version = %min_version, "watcher registered");
        self.watchers.insert(
            id,
            Watcher {
                application: application.to_string(),
                min_version,
                sender,
            },
        );
        Subscription { id, receiver }
    }

    /// Remove a watcher and close its queue. Returns `true` if it existed.
    pub fn unregister(&self, id: &SubscriptionId) -> bool {
        let removed = self.watchers.remove(id).is_some();
        if removed {
            debug!(subscription = %id, "watcher unregistered");
        }
        removed
    }

    /// Enqueue `event` for every watcher of its application whose minimum
    /// version does not exceed the changed version. Returns the number of
    /// watchers notified.
    pub fn dispatch(&self, event: &ChangeEvent) -> usize {
        let changed = match SemanticVersion::parse(&event.version) {
            Ok(version) => version,
            Err(e) => {
                warn!(event = %event, error = %e, "not dispatching change with invalid version");
                return 0;
            }
        };

        let mut notified = 0;
        let mut closed = Vec::new();
        for watcher in self.watchers.iter() {
            if watcher.application != event.application || watcher.min_version > changed {
                continue;
            }
            if watcher.sender.send(event.clone()).is_ok() {
                notified += 1;
            } else {
                closed.push(*watcher.key());
            }
        }
        // Removal must wait until the iterator has released its shard locks.
        for id in closed {
            if self.watchers.remove_if(&id, |_, w| w.sender.is_closed()).is_some() {
                trace!(subscription = %id, "removed watcher with closed queue");
            }
        }
        notified
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.watchers.contains_key(id)
    }
}

/// Unregisters its subscription when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    id: SubscriptionId,
    registry: Arc<WatchRegistry>,
}

impl SubscriptionGuard {
    pub fn new(id: SubscriptionId, registry: Arc<WatchRegistry>) -> Self {
        Self { id, registry }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}

/// Destination of a subscription's notifications, typically a client stream.
#[async_trait]
pub trait WatchSink: Send {
    /// Deliver one notification. An error ends the subscription.
    async fn send(&mut self, event: ChangeEvent) -> SyncResult<()>;
}

#[async_trait]
impl WatchSink for mpsc::Sender<ChangeEvent> {
    async fn send(&mut self, event: ChangeEvent) -> SyncResult<()> {
        mpsc::Sender::send(self, event)
            .await
            .map_err(|_| SyncError::SinkClosed)
    }
}

#[async_trait]
impl WatchSink for mpsc::UnboundedSender<ChangeEvent> {
    async fn send(&mut self, event: ChangeEvent) -> SyncResult<()> {
        mpsc::UnboundedSender::send(self, event).map_err(|_| SyncError::SinkClosed)
    }
}

/// Why a pump stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpExit {
    /// The caller's cancellation token fired.
    Cancelled,
    /// The sink rejected a notification.
    SinkClosed,
    /// The watcher was unregistered elsewhere.
    QueueClosed,
}

/// Forwards one subscription's queue to a sink.
#[derive(Debug)]
pub struct WatchPump {
    guard: SubscriptionGuard,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl WatchPump {
    pub fn new(subscription: Subscription, registry: Arc<WatchRegistry>) -> Self {
        Self {
            guard: SubscriptionGuard::new(subscription.id, registry),
            receiver: subscription.receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.guard.id()
    }

    /// Run until cancellation, sink failure or queue closure. The watcher is
    /// unregistered on return.
    pub async fn run<S>(mut self, cancel: CancellationToken, sink: &mut S) -> PumpExit
    where
        S: WatchSink + ?Sized,
    {
        let id = self.guard.id();
        debug!(subscription = %id, "watch stream started");
        let exit = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break PumpExit::Cancelled,
                next = self.receiver.recv() => match next {
                    Some(event) => {
                        trace!(subscription = %id, event = %event, "forwarding change");
                        if sink.send(event).await.is_err() {
                            break PumpExit::SinkClosed;
                        }
                    }
                    None => break PumpExit::QueueClosed,
                },
            }
        };
        debug!(subscription = %id, exit = ?exit, "watch stream ended");
        exit
    }
}
