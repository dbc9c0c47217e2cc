//! Configuration merging for Vecosy.
//!
//! A merge reads an ordered list of candidate files from one resolved
//! application version and deep-merges them, later files overriding
//! earlier ones. The [`MergeStrategy`] decides which files and in which
//! order; the merge primitive ([`deep_merge`]) is shared by all strategies.
//!
//! # Strategies
//!
//! - [`SmartConfigStrategy`] -- `config.yml` then `{profile}/config.yml`
//! - [`SpringStrategy`] -- `application.yml`, `{app}.yml`,
//!   `application-{profile}.yml`, `{app}-{profile}.yml`

pub mod document;
pub mod engine;
pub mod error;
pub mod strategy;

pub use document::{deep_merge, flatten, parse_document, Document, DocumentFormat};
pub use engine::{ConfigMergeEngine, PropertySource};
pub use error::{MergeError, MergeResult};
pub use strategy::{MergeStrategy, SmartConfigStrategy, SpringFileName, SpringStrategy};
