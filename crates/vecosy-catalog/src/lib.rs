//! Version catalog and snapshot resolution for Vecosy.
//!
//! The [`VersionCatalog`] is an immutable index built from reference names:
//! application name to a descending list of [`VersionEntry`] records. A new
//! catalog is built from scratch on every successful fetch and published
//! atomically; [`detect_changes`] compares two generations by value.
//!
//! The [`SnapshotResolver`] answers "application X at version <= V" with the
//! nearest catalog entry not exceeding V and reads files from it.

pub mod catalog;
pub mod diff;
pub mod error;
pub mod resolver;

pub use catalog::{Application, VersionCatalog, VersionEntry};
pub use diff::detect_changes;
pub use error::{ResolveError, ResolveResult};
pub use resolver::{SnapshotReader, SnapshotResolver};
