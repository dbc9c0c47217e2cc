use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vecosy_types::ObjectId;

/// Domain separator for snapshot hashing.
const SNAPSHOT_DOMAIN: &[u8] = b"vecosy:snapshot:v1\0";

/// An immutable set of files, keyed by slash-separated path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    files: BTreeMap<String, Vec<u8>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content at the same path.
    pub fn with_file(mut self, path: impl AsRef<str>, content: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(normalize_path(path.as_ref()), content.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&normalize_path(path)).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Content identity: BLAKE3 over the length-prefixed, path-sorted entries.
    pub fn id(&self) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SNAPSHOT_DOMAIN);
        for (path, content) in &self.files {
            hasher.update(&(path.len() as u64).to_le_bytes());
            hasher.update(path.as_bytes());
            hasher.update(&(content.len() as u64).to_le_bytes());
            hasher.update(content);
        }
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}
