use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};
use vecosy_refs::{Reference, ReferenceNamingConvention};
use vecosy_types::SemanticVersion;

/// One available version of an application and the reference to read it from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: SemanticVersion,
    pub reference: Reference,
}

impl VersionEntry {
    /// Whether this entry should replace `other` for the same version.
    ///
    /// Tags win over local branches, which win over remote-tracking
    /// branches; within one kind the greater reference name wins.
    fn outranks(&self, other: &VersionEntry) -> bool {
        (self.reference.kind, &self.reference.name) > (other.reference.kind, &other.reference.name)
    }
}

/// An application and its versions, sorted descending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Application {
    name: String,
    entries: Vec<VersionEntry>,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries from newest to oldest.
    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    /// The entry for exactly `version`.
    pub fn get(&self, version: &SemanticVersion) -> Option<&VersionEntry> {
        self.entries.iter().find(|e| &e.version == version)
    }

    /// The newest entry satisfying `<= requested`. Prereleases are only
    /// chosen for prerelease requests of the same `major.minor.patch`.
    pub fn nearest(&self, requested: &SemanticVersion) -> Option<&VersionEntry> {
        self.entries.iter().find(|e| e.version.is_at_most(requested))
    }
}

/// Immutable index of applications and their versions.
///
/// Built wholesale from a reference listing and never mutated afterwards;
/// a fetch produces a new catalog and the two are compared by value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    apps: BTreeMap<String, Application>,
}

impl VersionCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from a reference listing.
    ///
    /// References that do not follow the naming convention, or whose version
    /// component is not a semantic version, are logged and skipped.
    pub fn build(references: &[Reference]) -> Self {
        let convention = ReferenceNamingConvention;
        let mut grouped: BTreeMap<String, HashMap<SemanticVersion, VersionEntry>> =
            BTreeMap::new();

        for reference in references {
            let parsed = match convention.parse(reference) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(reference = %reference.name, error = %e, "skipping reference");
                    continue;
                }
            };
            let entry = VersionEntry {
                version: parsed.version,
                reference: reference.clone(),
            };
            let versions = grouped.entry(parsed.application).or_default();
            match versions.get(&entry.version) {
                Some(existing) if !entry.outranks(existing) => {
                    debug!(
                        reference = %reference.name,
                        kept = %existing.reference.name,
                        "reference shadowed by another with the same version"
                    );
                }
                _ => {
                    versions.insert(entry.version.clone(), entry);
                }
            }
        }

        let apps = grouped
            .into_iter()
            .map(|(name, versions)| {
                let mut entries: Vec<VersionEntry> = versions.into_values().collect();
                entries.sort_by(|a, b| a.version.cmp(&b.version));
                entries.reverse();
                (name.clone(), Application { name, entries })
            })
            .collect();

        Self { apps }
    }

    pub fn get(&self, name: &str) -> Option<&Application> {
        self.apps.get(name)
    }

    /// Applications sorted by name.
    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.apps.values()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Application name to its versions, newest first, as written in the
    /// reference names.
    pub fn apps_versions(&self) -> BTreeMap<String, Vec<String>> {
        self.apps
            .iter()
            .map(|(name, app)| {
                let versions = app
                    .entries
                    .iter()
                    .map(|e| e.version.original().to_string())
                    .collect();
                (name.clone(), versions)
            })
            .collect()
    }
}
