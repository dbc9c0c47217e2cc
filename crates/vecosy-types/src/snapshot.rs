use serde::{Deserialize, Serialize};

/// A file read from an immutable snapshot.
///
/// `version` identifies the snapshot the bytes came from (its content hash),
/// not the version the caller asked for: two requests for `1.2.0` and
/// `1.3.0` that resolve to the same snapshot return the same `version`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub version: String,
    pub content: Vec<u8>,
}

impl SnapshotFile {
    pub fn new(version: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            version: version.into(),
            content,
        }
    }

    /// The content as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}
