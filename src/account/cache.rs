//! Lookup cache
//!
//! Remembers the last snapshot resolved for each address during a
//! manager's lifetime. Entries are overwritten whenever an address resolves
//! to a single entry and are never cleared otherwise, so a cached snapshot
//! can describe an entry that has since changed or been deleted.

use super::status::Snapshot;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct LookupCache {
    snapshots: HashMap<String, Snapshot>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot under the address it was resolved for
    pub fn store(&mut self, snapshot: Snapshot) {
        self.snapshots
            .insert(snapshot.address().to_string(), snapshot);
    }

    pub fn get(&self, address: &str) -> Option<&Snapshot> {
        self.snapshots.get(address)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_directory::Entry;

    #[test]
    fn test_store_overwrites() {
        let mut cache = LookupCache::new();
        assert!(cache.is_empty());

        cache.store(Snapshot::new(
            "bob@example.org",
            Entry::new("uid=bob").with_attr("aliasAddress", ["sales@example.org"]),
        ));
        cache.store(Snapshot::new("bob@example.org", Entry::new("uid=bob")));

        assert_eq!(cache.len(), 1);
        let snapshot = cache.get("bob@example.org").unwrap();
        assert!(snapshot.allow_list().is_empty());
        assert!(cache.get("alice@example.org").is_none());
    }
}
