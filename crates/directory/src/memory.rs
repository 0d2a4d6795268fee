//! In-process directory
//!
//! Keeps entries in memory and applies the same constraint checks an LDAP
//! server would for the operations this crate exposes. Parent entries are
//! not required to exist.

use crate::{Directory, Entry, Error, Filter, ModOp, Modification, Result, Scope};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    // keyed by normalized DN
    entries: BTreeMap<String, Entry>,
    failing: HashSet<String>,
    closed: bool,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry as-is, replacing any entry with the same DN
    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(normalize(&entry.dn), entry);
    }

    /// Look up an entry by DN
    pub fn get(&self, dn: &str) -> Option<&Entry> {
        self.entries.get(&normalize(dn))
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Make every write against `dn` fail with [`Error::Unavailable`]
    pub fn fail_writes_to(&mut self, dn: &str) {
        self.failing.insert(normalize(dn));
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_writable(&self, dn: &str) -> Result<()> {
        self.ensure_open()?;
        if self.failing.contains(&normalize(dn)) {
            return Err(Error::Unavailable(format!("write to {} rejected", dn)));
        }
        Ok(())
    }
}

impl Directory for MemoryDirectory {
    fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &Filter,
        attrs: &[&str],
    ) -> Result<Vec<Entry>> {
        self.ensure_open()?;

        let base = normalize(base);
        Ok(self
            .entries
            .iter()
            .filter(|(dn, _)| in_scope(dn, &base, scope))
            .filter(|(_, entry)| filter.matches(entry))
            .map(|(_, entry)| entry.project(attrs))
            .collect())
    }

    fn add(&mut self, dn: &str, attrs: Vec<(String, Vec<String>)>) -> Result<()> {
        self.ensure_writable(dn)?;

        let key = normalize(dn);
        if self.entries.contains_key(&key) {
            return Err(Error::AlreadyExists(dn.to_string()));
        }

        let mut entry = Entry::new(dn);
        for (name, values) in attrs {
            entry.attrs.entry(name).or_default().extend(values);
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    fn delete(&mut self, dn: &str) -> Result<()> {
        self.ensure_writable(dn)?;

        self.entries
            .remove(&normalize(dn))
            .map(|_| ())
            .ok_or_else(|| Error::NoSuchEntry(dn.to_string()))
    }

    fn modify(&mut self, dn: &str, mods: Vec<Modification>) -> Result<()> {
        self.ensure_writable(dn)?;

        let current = self
            .entries
            .get(&normalize(dn))
            .ok_or_else(|| Error::NoSuchEntry(dn.to_string()))?;

        // Work on a copy so a failing modification leaves the entry untouched
        let mut entry = current.clone();
        for m in mods {
            apply(&mut entry, m)?;
        }
        entry.attrs.retain(|_, values| !values.is_empty());

        self.entries.insert(normalize(dn), entry);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn apply(entry: &mut Entry, m: Modification) -> Result<()> {
    let key = entry
        .attrs
        .keys()
        .find(|k| k.eq_ignore_ascii_case(&m.attribute))
        .cloned()
        .unwrap_or_else(|| m.attribute.clone());

    match m.op {
        ModOp::Add => {
            if entry.has_value(&key, &m.value) {
                return Err(Error::ValueExists {
                    dn: entry.dn.clone(),
                    attribute: m.attribute,
                    value: m.value,
                });
            }
            entry.attrs.entry(key).or_default().push(m.value);
        }
        ModOp::Replace => {
            entry.attrs.insert(key, vec![m.value]);
        }
        ModOp::Delete => {
            if !entry.has_value(&key, &m.value) {
                return Err(Error::NoSuchValue {
                    dn: entry.dn.clone(),
                    attribute: m.attribute,
                    value: m.value,
                });
            }
            if let Some(values) = entry.attrs.get_mut(&key) {
                values.retain(|v| !v.eq_ignore_ascii_case(&m.value));
            }
        }
    }

    Ok(())
}

/// Lowercase and strip spaces around RDN separators
fn normalize(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| rdn.trim().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

fn in_scope(dn: &str, base: &str, scope: Scope) -> bool {
    if base.is_empty() {
        return match scope {
            Scope::Base => dn.is_empty(),
            Scope::OneLevel => !dn.is_empty() && !dn.contains(','),
            Scope::Subtree => true,
        };
    }

    if dn == base {
        return scope != Scope::OneLevel;
    }

    let Some(prefix) = dn.strip_suffix(base).and_then(|p| p.strip_suffix(',')) else {
        return false;
    };

    match scope {
        Scope::Base => false,
        Scope::OneLevel => !prefix.contains(','),
        Scope::Subtree => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOB: &str = "uid=bob,ou=users,dc=example,dc=org";

    fn bob_attrs() -> Vec<(String, Vec<String>)> {
        vec![
            ("objectClass".to_string(), vec!["mailUser".to_string()]),
            ("mail".to_string(), vec!["bob@example.org".to_string()]),
        ]
    }

    #[test]
    fn test_add_and_search() {
        let mut dir = MemoryDirectory::new();
        dir.add(BOB, bob_attrs()).unwrap();

        let found = dir
            .search(
                "dc=example,dc=org",
                Scope::Subtree,
                &Filter::equals("mail", "bob@example.org"),
                &["objectClass"],
            )
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dn, BOB);
        assert!(found[0].has_value("objectClass", "mailUser"));
        assert!(found[0].values("mail").is_empty());
    }

    #[test]
    fn test_add_duplicate_dn() {
        let mut dir = MemoryDirectory::new();
        dir.add(BOB, bob_attrs()).unwrap();

        let result = dir.add("UID=bob, ou=users, dc=example, dc=org", bob_attrs());
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_delete_missing() {
        let mut dir = MemoryDirectory::new();
        assert!(matches!(dir.delete(BOB), Err(Error::NoSuchEntry(_))));
    }

    #[test]
    fn test_modify_add_delete_replace() {
        let mut dir = MemoryDirectory::new();
        dir.add(BOB, bob_attrs()).unwrap();

        dir.modify(BOB, vec![Modification::add("aliasAddress", "sales@example.org")])
            .unwrap();
        assert!(dir.get(BOB).unwrap().has_value("aliasAddress", "sales@example.org"));

        let again = dir.modify(BOB, vec![Modification::add("aliasAddress", "sales@example.org")]);
        assert!(matches!(again, Err(Error::ValueExists { .. })));

        dir.modify(BOB, vec![Modification::delete("aliasAddress", "sales@example.org")])
            .unwrap();
        assert!(dir.get(BOB).unwrap().values("aliasAddress").is_empty());

        let missing = dir.modify(BOB, vec![Modification::delete("aliasAddress", "sales@example.org")]);
        assert!(matches!(missing, Err(Error::NoSuchValue { .. })));

        dir.modify(BOB, vec![Modification::replace("accountStatus", "disabled")])
            .unwrap();
        dir.modify(BOB, vec![Modification::replace("accountStatus", "active")])
            .unwrap();
        assert_eq!(
            dir.get(BOB).unwrap().values("accountStatus"),
            ["active".to_string()]
        );
    }

    #[test]
    fn test_modify_is_all_or_nothing() {
        let mut dir = MemoryDirectory::new();
        dir.add(BOB, bob_attrs()).unwrap();

        let result = dir.modify(
            BOB,
            vec![
                Modification::add("aliasAddress", "sales@example.org"),
                Modification::delete("aliasAddress", "info@example.org"),
            ],
        );
        assert!(result.is_err());
        assert!(dir.get(BOB).unwrap().values("aliasAddress").is_empty());
    }

    #[test]
    fn test_scopes() {
        assert!(in_scope("dc=example,dc=org", "dc=example,dc=org", Scope::Base));
        assert!(!in_scope("ou=users,dc=example,dc=org", "dc=example,dc=org", Scope::Base));
        assert!(in_scope("ou=users,dc=example,dc=org", "dc=example,dc=org", Scope::OneLevel));
        assert!(!in_scope(
            "uid=bob,ou=users,dc=example,dc=org",
            "dc=example,dc=org",
            Scope::OneLevel
        ));
        assert!(in_scope(
            "uid=bob,ou=users,dc=example,dc=org",
            "dc=example,dc=org",
            Scope::Subtree
        ));
        assert!(!in_scope("uid=bob,dc=other,dc=org", "dc=example,dc=org", Scope::Subtree));
        assert!(!in_scope("dc=badexample,dc=org", "dc=example,dc=org", Scope::Subtree));
    }

    #[test]
    fn test_failure_injection() {
        let mut dir = MemoryDirectory::new();
        dir.add(BOB, bob_attrs()).unwrap();
        dir.fail_writes_to(BOB);

        let result = dir.modify(BOB, vec![Modification::replace("accountStatus", "disabled")]);
        assert!(matches!(result, Err(Error::Unavailable(_))));
        assert!(matches!(dir.delete(BOB), Err(Error::Unavailable(_))));
    }

    #[test]
    fn test_closed_directory() {
        let mut dir = MemoryDirectory::new();
        dir.close().unwrap();
        assert!(dir.is_closed());

        let result = dir.search("", Scope::Subtree, &Filter::present("mail"), &[]);
        assert!(matches!(result, Err(Error::Closed)));
        assert!(matches!(dir.add(BOB, bob_attrs()), Err(Error::Closed)));
    }
}
