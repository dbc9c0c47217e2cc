//! Change detection between two catalog generations.

use vecosy_types::ChangeEvent;

use crate::catalog::VersionCatalog;

/// Compute the change events between `old` and `new`.
///
/// A version is reported when its application is absent from `old`, when
/// the version itself is absent from the old application, or when the
/// snapshot its reference points at differs. Removed versions are not
/// reported. Events are ordered by application name, newest version first.
pub fn detect_changes(old: &VersionCatalog, new: &VersionCatalog) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    for app in new.applications() {
        let previous = old.get(app.name());
        for entry in app.entries() {
            let changed = match previous.and_then(|p| p.get(&entry.version)) {
                None => true,
                Some(before) => before.reference.target != entry.reference.target,
            };
            if changed {
                events.push(ChangeEvent::new(app.name(), entry.version.original()));
            }
        }
    }
    events
}
