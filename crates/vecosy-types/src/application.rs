use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::version::SemanticVersion;

/// A requested `(application, version)` pair as received from a caller.
///
/// Both halves are kept as raw strings until [`ApplicationVersion::validate`]
/// is called; transports validate before touching the store so malformed
/// requests are rejected as bad requests rather than "not found".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationVersion {
    pub app_name: String,
    pub app_version: String,
}

impl ApplicationVersion {
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
        }
    }

    /// Validate the name and parse the version.
    pub fn validate(&self) -> Result<SemanticVersion, ValidationError> {
        validate_app_name(&self.app_name)?;
        SemanticVersion::parse(&self.app_version)
    }
}

impl fmt::Display for ApplicationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.app_name, self.app_version)
    }
}

/// Validate an application name.
///
/// Names are one reference path component: non-empty and made of ASCII
/// letters, digits, `-` and `.` only.
pub fn validate_app_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidApplicationIdentifier {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("application name must not be empty".into()));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
    {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be a relative path component".into()));
    }
    Ok(())
}
