use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use vecosy_catalog::SnapshotReader;
use vecosy_types::SemanticVersion;

use crate::document::{deep_merge, flatten, parse_document, Document};
use crate::error::MergeResult;
use crate::strategy::MergeStrategy;

/// One readable configuration file, flattened to dot-separated keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertySource {
    /// Path of the file inside the snapshot.
    pub name: String,
    /// Identity of the snapshot the file was read from.
    pub version: String,
    pub source: BTreeMap<String, Value>,
}

/// Reads candidate files through a [`SnapshotReader`] and merges them.
#[derive(Clone)]
pub struct ConfigMergeEngine {
    reader: Arc<dyn SnapshotReader>,
}

impl ConfigMergeEngine {
    pub fn new(reader: Arc<dyn SnapshotReader>) -> Self {
        Self { reader }
    }

    /// Merge the candidate files of `strategy` for `(app, version, profiles)`.
    ///
    /// A file that cannot be read is skipped with a warning, including when
    /// no version of the application is old enough; only an unknown
    /// application aborts the merge. A file that exists but does not parse
    /// also aborts it.
    pub async fn merge(
        &self,
        app: &str,
        version: &SemanticVersion,
        profiles: &[String],
        strategy: &dyn MergeStrategy,
    ) -> MergeResult<Document> {
        let mut merged = Value::Object(Map::new());
        for path in strategy.candidate_paths(app, profiles) {
            match self.reader.read_file(app, version, &path).await {
                Ok(file) => {
                    let document = parse_document(&path, &file.content)?;
                    debug!(app, path = %path, strategy = strategy.name(), "merging file");
                    deep_merge(&mut merged, document);
                }
                Err(e) if e.is_application_not_found() => return Err(e.into()),
                Err(e) => {
                    warn!(app, path = %path, error = %e, "skipping configuration file");
                }
            }
        }
        Ok(merged)
    }

    /// Each readable candidate file of `strategy`, in candidate order, as a
    /// flattened property source.
    ///
    /// Missing and unparseable files are skipped.
    pub async fn property_sources(
        &self,
        app: &str,
        version: &SemanticVersion,
        profiles: &[String],
        strategy: &dyn MergeStrategy,
    ) -> MergeResult<Vec<PropertySource>> {
        let mut sources = Vec::new();
        for path in strategy.candidate_paths(app, profiles) {
            let file = match self.reader.read_file(app, version, &path).await {
                Ok(file) => file,
                Err(e) if e.is_application_not_found() => return Err(e.into()),
                Err(e) => {
                    warn!(app, path = %path, error = %e, "skipping property source");
                    continue;
                }
            };
            match parse_document(&path, &file.content) {
                Ok(document) => sources.push(PropertySource {
                    source: flatten(&document),
                    name: path,
                    version: file.version,
                }),
                Err(e) => warn!(app, path = %path, error = %e, "skipping property source"),
            }
        }
        Ok(sources)
    }
}

impl std::fmt::Debug for ConfigMergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMergeEngine").finish_non_exhaustive()
    }
}
