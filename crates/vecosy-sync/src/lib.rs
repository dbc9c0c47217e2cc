//! Synchronization and change notification for Vecosy.
//!
//! # Architecture
//!
//! ```text
//! FetchScheduler (tick or manual fetch)
//!   fetch -> rebuild catalog -> diff -> swap        (one critical section)
//!                                        |
//!                                  ChangeNotifier
//!                                  |            |
//!                        change handlers    WatchRegistry
//!                                               | per-watcher queue
//!                                           WatchPump -> WatchSink
//! ```
//!
//! Each watcher owns a private unbounded queue, so a slow consumer never
//! holds up dispatch to the others.

pub mod error;
pub mod notifier;
pub mod scheduler;
pub mod watch;

pub use error::{SyncError, SyncResult};
pub use notifier::{ChangeHandler, ChangeNotifier, ErrorListener};
pub use scheduler::{FetchReport, FetchScheduler};
pub use watch::{
    PumpExit, Subscription, SubscriptionGuard, SubscriptionId, WatchPump, WatchRegistry, WatchSink,
};
