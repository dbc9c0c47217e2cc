//! Vecosy configuration repository.
//!
//! [`ConfigRepo`] is the transport-independent surface of the system: it
//! owns one catalog, resolver, fetch scheduler, watch registry, merge engine
//! and token verifier for one object store. Transport layers (REST, gRPC,
//! streaming) hold a `ConfigRepo` and translate [`RepoError::class`] into
//! their own status codes.
//!
//! # Quick Start
//!
//! ```ignore
//! let store = Arc::new(InMemoryObjectStore::clone_from(upstream)?);
//! let repo = ConfigRepo::new(store, RepoConfig::default())?;
//! repo.init().await?;
//!
//! let file = repo.get_file("app1", "1.2.0", "config.yml").await?;
//! let merged = repo.merge_config("app1", "1.2.0", &["dev".into()], &repo.smart_config_strategy()).await?;
//! ```

pub mod config;
pub mod error;
pub mod repo;

pub use config::RepoConfig;
pub use error::{ErrorClass, RepoError, RepoResult};
pub use repo::ConfigRepo;

pub use vecosy_catalog::VersionEntry;
pub use vecosy_merge::{Document, MergeStrategy, PropertySource, SmartConfigStrategy, SpringStrategy};
pub use vecosy_sync::{FetchReport, PumpExit, Subscription, SubscriptionId, WatchSink};
pub use vecosy_types::{ChangeEvent, SnapshotFile};
