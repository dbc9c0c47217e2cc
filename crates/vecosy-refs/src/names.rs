//! The reference naming convention.
//!
//! A reference contributes an application version when its short name ends
//! in `<application>/<version>`:
//!
//! - `refs/heads/app1/1.0.0`
//! - `refs/tags/app1/1.0.0`
//! - `refs/remotes/origin/app1/1.0.0`
//! - `refs/heads/release/app1/1.0.0` (leading components are ignored)
//!
//! Both components may only contain ASCII letters, digits, `-` and `.`.
//! Names that do not follow the convention are not errors for the catalog;
//! the build logs them and moves on.

use vecosy_types::SemanticVersion;

use crate::error::{RefError, Result};
use crate::types::{RefKind, Reference};

/// Result of applying the naming convention to a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedReference {
    pub application: String,
    pub version: SemanticVersion,
}

/// Parse rule from raw reference names to `(application, version)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceNamingConvention;

impl ReferenceNamingConvention {
    /// Split a canonical reference name into `(application, version string)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vecosy_refs::ReferenceNamingConvention;
    ///
    /// let conv = ReferenceNamingConvention;
    /// assert_eq!(
    ///     conv.split("refs/tags/app1/1.0.0").unwrap(),
    ///     ("app1", "1.0.0")
    /// );
    /// assert!(conv.split("refs/heads/main").is_err());
    /// ```
    pub fn split<'a>(&self, name: &'a str) -> Result<(&'a str, &'a str)> {
        let (_, short) =
            RefKind::classify(name).ok_or_else(|| RefError::UnsupportedNamespace {
                name: name.to_string(),
            })?;

        let mismatch = |reason: &str| RefError::ConventionMismatch {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let mut components = short.rsplit('/');
        let (Some(version), Some(application)) = (components.next(), components.next()) else {
            return Err(mismatch("expected <application>/<version>"));
        };

        for (label, component) in [("application", application), ("version", version)] {
            if component.is_empty() {
                return Err(mismatch(&format!("empty {label} component")));
            }
            if let Some(bad) = component.chars().find(|c| !is_convention_char(*c)) {
                return Err(mismatch(&format!(
                    "{label} component contains forbidden character {bad:?}"
                )));
            }
        }

        Ok((application, version))
    }

    /// Apply the convention and parse the version component.
    pub fn parse(&self, reference: &Reference) -> Result<ParsedReference> {
        let (application, version) = self.split(&reference.name)?;
        let parsed =
            SemanticVersion::parse(version).map_err(|e| RefError::InvalidVersion {
                name: reference.name.clone(),
                version: version.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ParsedReference {
            application: application.to_string(),
            version: parsed,
        })
    }
}

fn is_convention_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecosy_types::ObjectId;

    fn reference(name: &str) -> Reference {
        Reference::from_canonical(name, ObjectId::from_bytes(name.as_bytes())).unwrap()
    }

    #[test]
    fn splits_all_namespaces() {
        let conv = ReferenceNamingConvention;
        assert_eq!(conv.split("refs/heads/app1/1.0.0").unwrap(), ("app1", "1.0.0"));
        assert_eq!(conv.split("refs/tags/my-app/v2").unwrap(), ("my-app", "v2"));
        assert_eq!(
            conv.split("refs/remotes/origin/app.x/1.0.1").unwrap(),
            ("app.x", "1.0.1")
        );
    }

    #[test]
    fn uses_last_two_components() {
        let conv = ReferenceNamingConvention;
        assert_eq!(
            conv.split("refs/heads/release/app1/3.1.0").unwrap(),
            ("app1", "3.1.0")
        );
    }

    #[test]
    fn rejects_single_component_names() {
        let conv = ReferenceNamingConvention;
        let err = conv.split("refs/heads/main").unwrap_err();
        assert!(matches!(err, RefError::ConventionMismatch { .. }));
    }

    #[test]
    fn rejects_forbidden_characters() {
        let conv = ReferenceNamingConvention;
        assert!(conv.split("refs/heads/app_1/1.0.0").is_err());
        assert!(conv.split("refs/heads/app1/1.0.0+x").is_err());
        assert!(conv.split("refs/heads/app1/").is_err());
    }

    #[test]
    fn rejects_unknown_namespace() {
        let conv = ReferenceNamingConvention;
        assert!(matches!(
            conv.split("refs/notes/app1/1.0.0"),
            Err(RefError::UnsupportedNamespace { .. })
        ));
    }

    #[test]
    fn parse_extracts_semantic_version() {
        let parsed = ReferenceNamingConvention
            .parse(&reference("refs/tags/app1/1.0.1"))
            .unwrap();
        assert_eq!(parsed.application, "app1");
        assert_eq!(parsed.version, SemanticVersion::parse("1.0.1").unwrap());
    }

    #[test]
    fn parse_reports_unparseable_versions() {
        let err = ReferenceNamingConvention
            .parse(&reference("refs/heads/app1/latest"))
            .unwrap_err();
        assert!(matches!(err, RefError::InvalidVersion { ref version, .. } if version == "latest"));
    }
}
