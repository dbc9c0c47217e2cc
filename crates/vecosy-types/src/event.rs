use std::fmt;

use serde::{Deserialize, Serialize};

/// One application version that is new, or whose snapshot changed, since
/// the previously published catalog.
///
/// `version` is the version string as it appears in the reference name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub application: String,
    pub version: String,
}

impl ChangeEvent {
    pub fn new(application: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.application, self.version)
    }
}
