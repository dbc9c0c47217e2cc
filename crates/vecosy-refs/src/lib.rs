//! Reference handling for Vecosy.
//!
//! References are named pointers (branches, remote-tracking branches and
//! tags) into the configuration history. Each reference that follows the
//! naming convention `<prefix>/<application>/<version>` contributes one
//! application version to the catalog.
//!
//! # Modules
//!
//! - [`error`]: Error types for reference parsing
//! - [`types`]: [`Reference`] and [`RefKind`]
//! - [`names`]: The [`ReferenceNamingConvention`]

pub mod error;
pub mod names;
pub mod types;

pub use error::{RefError, Result};
pub use names::{ParsedReference, ReferenceNamingConvention};
pub use types::{RefKind, Reference};
