//! Change tracking since the last load or save.

use crate::model::dto::Guid;
use std::collections::BTreeSet;

/// Guids added, modified and removed since the repository was loaded.
///
/// A guid sits in at most one set. Adding then removing a guid in the same
/// session leaves no trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: BTreeSet<Guid>,
    modified: BTreeSet<Guid>,
    removed: BTreeSet<Guid>,
}

impl ChangeSet {
    pub fn added(&self) -> &BTreeSet<Guid> {
        &self.added
    }

    pub fn modified(&self) -> &BTreeSet<Guid> {
        &self.modified
    }

    pub fn removed(&self) -> &BTreeSet<Guid> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub(crate) fn record_added(&mut self, guid: Guid) {
        // Removed then re-added within one session is an overwrite.
        if self.removed.remove(&guid) {
            self.modified.insert(guid);
        } else {
            self.added.insert(guid);
        }
    }

    pub(crate) fn record_modified(&mut self, guid: Guid) {
        if !self.added.contains(&guid) {
            self.modified.insert(guid);
        }
    }

    pub(crate) fn record_removed(&mut self, guid: Guid) {
        if self.added.remove(&guid) {
            return;
        }
        self.modified.remove(&guid);
        self.removed.insert(guid);
    }

    pub(crate) fn clear(&mut self) {
        self.added.clear();
        self.modified.clear();
        self.removed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeSet;
    use uuid::Uuid;

    #[test]
    fn added_then_removed_leaves_no_trace() {
        let guid = Uuid::new_v4();
        let mut changes = ChangeSet::default();
        changes.record_added(guid);
        changes.record_modified(guid);
        changes.record_removed(guid);
        assert!(changes.is_empty());
    }

    #[test]
    fn removed_then_added_counts_as_modified() {
        let guid = Uuid::new_v4();
        let mut changes = ChangeSet::default();
        changes.record_modified(guid);
        changes.record_removed(guid);
        changes.record_added(guid);
        assert!(changes.removed().is_empty());
        assert!(changes.added().is_empty());
        assert!(changes.modified().contains(&guid));
    }
}
