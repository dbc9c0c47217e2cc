//! Core reference types.

use serde::{Deserialize, Serialize};
use vecosy_types::ObjectId;

/// The namespace a reference lives in.
///
/// Variants are declared in ascending precedence: when two references name
/// the same application version, the one with the greater kind wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefKind {
    /// `refs/remotes/{remote}/...`, updated only by fetches.
    RemoteBranch,
    /// `refs/heads/...`
    LocalBranch,
    /// `refs/tags/...`
    Tag,
}

impl RefKind {
    /// Classify a canonical ref name, returning the kind and the short name
    /// (the part after `refs/heads/`, `refs/tags/` or `refs/remotes/{remote}/`).
    pub fn classify(name: &str) -> Option<(RefKind, &str)> {
        if let Some(rest) = name.strip_prefix("refs/heads/") {
            return Some((RefKind::LocalBranch, rest));
        }
        if let Some(rest) = name.strip_prefix("refs/tags/") {
            return Some((RefKind::Tag, rest));
        }
        let rest = name.strip_prefix("refs/remotes/")?;
        let (_remote, short) = rest.split_once('/')?;
        Some((RefKind::RemoteBranch, short))
    }
}

/// A named pointer to a snapshot in the object store.
///
/// The `target` is the snapshot identity; it is what change detection
/// compares between two catalog generations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Canonical name (e.g. `refs/tags/app1/1.0.0`).
    pub name: String,
    pub kind: RefKind,
    pub target: ObjectId,
}

impl Reference {
    /// Build a reference from its canonical name.
    ///
    /// Returns `None` for names outside the branch, remote and tag
    /// namespaces (`HEAD`, notes, stashes).
    pub fn from_canonical(name: impl Into<String>, target: ObjectId) -> Option<Self> {
        let name = name.into();
        let (kind, _) = RefKind::classify(&name)?;
        Some(Self { name, kind, target })
    }

    /// The name without its namespace prefix.
    pub fn short_name(&self) -> &str {
        RefKind::classify(&self.name)
            .map(|(_, short)| short)
            .unwrap_or(&self.name)
    }

    pub fn is_tag(&self) -> bool {
        self.kind == RefKind::Tag
    }
}
