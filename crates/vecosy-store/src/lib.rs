//! Object store adapter for Vecosy.
//!
//! The configuration history lives in a version-controlled object store
//! that the core never writes to. This crate defines the narrow interface
//! the core consumes ([`ObjectStoreAdapter`]) and ships one complete
//! implementation of it.
//!
//! # Storage Backends
//!
//! - [`InMemoryObjectStore`] -- snapshot history held in memory, with an
//!   optional upstream it can be cloned from and fetch updates from. Used by
//!   tests and embedders.
//!
//! # Design Rules
//!
//! 1. Snapshots are immutable once committed; their identity is the BLAKE3
//!    hash of their content.
//! 2. A fetch is idempotent: "already up to date" is a successful outcome.
//! 3. Reads are addressed by the reference's target, so a reader holding an
//!    older reference keeps reading the snapshot it resolved.

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryObjectStore, DEFAULT_REMOTE};
pub use snapshot::Snapshot;
pub use traits::{FetchOutcome, ObjectStoreAdapter};
