//! Account status and resolution snapshots

use super::schema::{ATTR_ACCOUNT_STATUS, ATTR_ALIAS_ADDRESS, STATUS_ACTIVE};
use mail_directory::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an address currently is in the directory
///
/// Exactly one status holds for an address at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    User,
    Alias,
    List,
    External,
    Absent,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::User => write!(f, "user"),
            Status::Alias => write!(f, "alias"),
            Status::List => write!(f, "list"),
            Status::External => write!(f, "external"),
            Status::Absent => write!(f, "absent"),
            Status::Unknown => write!(f, "unknown"),
        }
    }
}

/// The entry observed for an address at resolve time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    address: String,
    entry: Entry,
}

impl Snapshot {
    pub fn new(address: impl Into<String>, entry: Entry) -> Self {
        Self {
            address: address.into(),
            entry,
        }
    }

    /// The address this snapshot was resolved for
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn dn(&self) -> &str {
        &self.entry.dn
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Alias addresses this entry allow-lists
    pub fn allow_list(&self) -> &[String] {
        self.entry.values(ATTR_ALIAS_ADDRESS)
    }

    pub fn allows(&self, alias: &str) -> bool {
        self.entry.has_value(ATTR_ALIAS_ADDRESS, alias)
    }

    /// Raw `accountStatus` value, if any
    pub fn account_status(&self) -> Option<&str> {
        self.entry.first(ATTR_ACCOUNT_STATUS)
    }

    /// An entry without an `accountStatus` is enabled; otherwise only
    /// `active` counts as enabled.
    pub fn is_enabled(&self) -> bool {
        self.account_status()
            .map_or(true, |s| s.eq_ignore_ascii_case(STATUS_ACTIVE))
    }
}

/// Outcome of resolving an address: its status and, when a single entry
/// was found, a snapshot of that entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: Status,
    pub snapshot: Option<Snapshot>,
}

impl Resolution {
    pub fn absent() -> Self {
        Self {
            status: Status::Absent,
            snapshot: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: Status::Unknown,
            snapshot: None,
        }
    }

    pub fn is(&self, status: Status) -> bool {
        self.status == status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_entry() -> Entry {
        Entry::new("uid=bob,ou=users,dc=example,dc=org")
            .with_attr("objectClass", ["mailUser"])
            .with_attr("aliasAddress", ["sales@example.org"])
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::User.to_string(), "user");
        assert_eq!(Status::Alias.to_string(), "alias");
        assert_eq!(Status::List.to_string(), "list");
        assert_eq!(Status::External.to_string(), "external");
        assert_eq!(Status::Absent.to_string(), "absent");
        assert_eq!(Status::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&Status::External).unwrap(), "\"external\"");
        let status: Status = serde_json::from_str("\"alias\"").unwrap();
        assert_eq!(status, Status::Alias);
    }

    #[test]
    fn test_snapshot_allow_list() {
        let snapshot = Snapshot::new("bob@example.org", user_entry());
        assert_eq!(snapshot.address(), "bob@example.org");
        assert_eq!(snapshot.dn(), "uid=bob,ou=users,dc=example,dc=org");
        assert!(snapshot.allows("sales@example.org"));
        assert!(!snapshot.allows("info@example.org"));
        assert_eq!(snapshot.allow_list().len(), 1);
    }

    #[test]
    fn test_snapshot_enabled_flag() {
        let snapshot = Snapshot::new("bob@example.org", user_entry());
        assert!(snapshot.is_enabled());
        assert_eq!(snapshot.account_status(), None);

        let disabled = Snapshot::new(
            "bob@example.org",
            user_entry().with_attr("accountStatus", ["disabled"]),
        );
        assert!(!disabled.is_enabled());

        let active = Snapshot::new(
            "bob@example.org",
            user_entry().with_attr("accountStatus", ["Active"]),
        );
        assert!(active.is_enabled());
    }
}
