use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A semantic version as written in a reference name or a request.
///
/// Parsing is lenient in the way configuration branches are usually named:
/// a leading `v` is ignored and missing `minor`/`patch` components default
/// to zero, so `1`, `1.2`, `v1.2.3` and `1.2.3-rc.1` are all accepted.
///
/// Ordering follows semver precedence (`1.0.0-alpha < 1.0.0 < 1.0.1`);
/// build metadata is ignored. The string the version was parsed from is
/// kept verbatim and is what [`fmt::Display`] prints, because catalog keys
/// and change events refer to the version exactly as it was written.
#[derive(Clone)]
pub struct SemanticVersion {
    original: String,
    inner: semver::Version,
}

impl SemanticVersion {
    /// Parse a version string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidVersionSyntax {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("version must not be empty"));
        }
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let (body, build) = match body.split_once('+') {
            Some((body, build)) => (body, Some(build)),
            None => (body, None),
        };
        let (core, pre) = match body.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (body, None),
        };

        let mut numbers = [0u64; 3];
        let components: Vec<&str> = core.split('.').collect();
        if components.len() > numbers.len() {
            return Err(invalid("at most three numeric components are allowed"));
        }
        for (slot, component) in numbers.iter_mut().zip(&components) {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("numeric components must be non-empty digits"));
            }
            *slot = component
                .parse()
                .map_err(|_| invalid("numeric component out of range"))?;
        }

        let mut normalized = format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]);
        if let Some(pre) = pre {
            normalized.push('-');
            normalized.push_str(pre);
        }
        if let Some(build) = build {
            normalized.push('+');
            normalized.push_str(build);
        }
        let inner = semver::Version::parse(&normalized).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            original: trimmed.to_string(),
            inner,
        })
    }

    /// The version string exactly as it was parsed (trimmed).
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The normalized semver representation.
    pub fn as_semver(&self) -> &semver::Version {
        &self.inner
    }

    /// `true` when this version satisfies the constraint `<= bound`.
    ///
    /// Unlike the total order, the constraint treats prereleases as opt-in:
    /// a prerelease only satisfies a prerelease bound with the same
    /// `major.minor.patch`, and never a release bound.
    pub fn is_at_most(&self, bound: &SemanticVersion) -> bool {
        let prerelease_allowed = match (self.is_prerelease(), bound.is_prerelease()) {
            (false, _) => true,
            (true, false) => false,
            (true, true) => self.core() == bound.core(),
        };
        prerelease_allowed && self <= bound
    }

    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }

    fn core(&self) -> (u64, u64, u64) {
        (self.inner.major, self.inner.minor, self.inner.patch)
    }

    fn precedence_key(&self) -> (u64, u64, u64, &semver::Prerelease) {
        (
            self.inner.major,
            self.inner.minor,
            self.inner.patch,
            &self.inner.pre,
        )
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_key().cmp(&other.precedence_key())
    }
}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precedence_key().hash(state);
    }
}

impl FromStr for SemanticVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SemanticVersion({})", self.original)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn parses_full_versions() {
        let ver = v("1.2.3");
        assert_eq!(ver.as_semver(), &semver::Version::new(1, 2, 3));
        assert_eq!(ver.original(), "1.2.3");
    }

    #[test]
    fn pads_missing_components() {
        assert_eq!(v("1").as_semver(), &semver::Version::new(1, 0, 0));
        assert_eq!(v("1.4").as_semver(), &semver::Version::new(1, 4, 0));
    }

    #[test]
    fn strips_leading_v_but_keeps_original() {
        let ver = v("v2.0.1");
        assert_eq!(ver.as_semver(), &semver::Version::new(2, 0, 1));
        assert_eq!(ver.to_string(), "v2.0.1");
    }

    #[test]
    fn accepts_prerelease_and_build() {
        let ver = v("1.0.0-rc.1+build.5");
        assert_eq!(ver.as_semver().pre.as_str(), "rc.1");
        assert_eq!(ver.as_semver().build.as_str(), "build.5");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "  ", "abc", "1.x", "1..2", "1.2.3.4", "-1", "1.0.0-"] {
            let err = SemanticVersion::parse(bad).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidVersionSyntax { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn ordering_follows_precedence() {
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.0.1") < v("6.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0"));
        assert!(v("1.9.0") < v("1.10.0"));
    }

    #[test]
    fn equal_versions_ignore_spelling_and_build() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("v1.0.0"), v("1.0.0+meta"));
    }

    #[test]
    fn at_most_constraint() {
        assert!(v("1.0.1").is_at_most(&v("5.0.0")));
        assert!(v("5.0.0").is_at_most(&v("5.0.0")));
        assert!(!v("6.0.0").is_at_most(&v("5.0.0")));
    }

    #[test]
    fn prereleases_only_satisfy_matching_prerelease_bounds() {
        assert!(!v("2.0.0-rc.1").is_at_most(&v("2.0.0")));
        assert!(!v("1.0.0-rc.1").is_at_most(&v("5.0.0")));
        assert!(v("2.0.0-rc.1").is_at_most(&v("2.0.0-rc.2")));
        assert!(!v("2.0.0-rc.2").is_at_most(&v("2.0.0-rc.1")));
        assert!(!v("1.9.0-rc.1").is_at_most(&v("2.0.0-rc.1")));
        assert!(v("1.9.0").is_at_most(&v("2.0.0-rc.1")));
        assert!(v("1.0.0-rc.1") < v("2.0.0"));
    }

    #[test]
    fn serde_uses_original_string() {
        let json = serde_json::to_string(&v("v1.2")).unwrap();
        assert_eq!(json, "\"v1.2\"");
        let back: SemanticVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back.original(), "v1.2");
    }

    proptest! {
        #[test]
        fn order_matches_numeric_tuple(a in (0u64..50, 0u64..50, 0u64..50), b in (0u64..50, 0u64..50, 0u64..50)) {
            let va = v(&format!("{}.{}.{}", a.0, a.1, a.2));
            let vb = v(&format!("{}.{}.{}", b.0, b.1, b.2));
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
