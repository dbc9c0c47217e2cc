//! Foundation types for Vecosy, the versioned configuration system.
//!
//! Every other Vecosy crate depends on `vecosy-types`.
//!
//! # Key Types
//!
//! - [`SemanticVersion`]: Lenient `major.minor.patch(-pre)` version with a total order
//! - [`ApplicationVersion`]: A requested `(application, version)` pair, validated before use
//! - [`ObjectId`]: Content-addressed snapshot identity (BLAKE3 hash)
//! - [`SnapshotFile`]: A file read from an immutable snapshot
//! - [`ChangeEvent`]: One application version that is new or whose snapshot changed

pub mod application;
pub mod error;
pub mod event;
pub mod object;
pub mod snapshot;
pub mod version;

pub use application::{validate_app_name, ApplicationVersion};
pub use error::ValidationError;
pub use event::ChangeEvent;
pub use object::ObjectId;
pub use snapshot::SnapshotFile;
pub use version::SemanticVersion;
