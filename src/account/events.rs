//! Account change events
//!
//! Every successful mutation returns an [`Event`]. What happens to it is up
//! to the caller: hand it to an [`EventSink`], serialize it, or drop it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed change to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub at: DateTime<Utc>,
    /// The address the operation targeted
    pub address: String,
    /// DN of the entry that was written
    pub dn: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    UserCreated,
    UserDeleted,
    UserEnabled,
    UserDisabled,
    CredentialChanged,
    AliasCreated { member_url: String },
    /// `detached` lists the DNs of users the alias was removed from
    AliasDeleted { detached: Vec<String> },
    AliasEnabled,
    AliasDisabled,
    AliasAllowed { alias: String },
    AliasDenied { alias: String },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::UserCreated => "user_created",
            EventKind::UserDeleted => "user_deleted",
            EventKind::UserEnabled => "user_enabled",
            EventKind::UserDisabled => "user_disabled",
            EventKind::CredentialChanged => "credential_changed",
            EventKind::AliasCreated { .. } => "alias_created",
            EventKind::AliasDeleted { .. } => "alias_deleted",
            EventKind::AliasEnabled => "alias_enabled",
            EventKind::AliasDisabled => "alias_disabled",
            EventKind::AliasAllowed { .. } => "alias_allowed",
            EventKind::AliasDenied { .. } => "alias_denied",
        }
    }
}

impl Event {
    pub(crate) fn new(address: &str, dn: impl Into<String>, kind: EventKind) -> Self {
        Self {
            at: Utc::now(),
            address: address.to_string(),
            dn: dn.into(),
            kind,
        }
    }
}

/// Consumer of account events
pub trait EventSink {
    fn record(&mut self, event: &Event);
}

/// Collects events in memory
impl EventSink for Vec<Event> {
    fn record(&mut self, event: &Event) {
        self.push(event.clone());
    }
}

/// Forwards events to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: &Event) {
        match &event.kind {
            EventKind::AliasCreated { member_url } => tracing::info!(
                event = event.kind.name(),
                address = %event.address,
                dn = %event.dn,
                member_url = %member_url,
                "Account change"
            ),
            EventKind::AliasDeleted { detached } => tracing::info!(
                event = event.kind.name(),
                address = %event.address,
                dn = %event.dn,
                detached = detached.len(),
                "Account change"
            ),
            EventKind::AliasAllowed { alias } | EventKind::AliasDenied { alias } => {
                tracing::info!(
                    event = event.kind.name(),
                    address = %event.address,
                    dn = %event.dn,
                    alias = %alias,
                    "Account change"
                )
            }
            _ => tracing::info!(
                event = event.kind.name(),
                address = %event.address,
                dn = %event.dn,
                "Account change"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Event> = Vec::new();
        let event = Event::new("bob@example.org", "uid=bob", EventKind::UserCreated);
        sink.record(&event);
        assert_eq!(sink, vec![event]);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        crate::logging::init_test();
        let mut sink = TracingSink;
        sink.record(&Event::new(
            "sales@example.org",
            "mail=sales@example.org",
            EventKind::AliasDeleted {
                detached: vec!["uid=bob".to_string()],
            },
        ));
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new(
            "bob@example.org",
            "uid=bob,dc=example,dc=org",
            EventKind::AliasAllowed {
                alias: "sales@example.org".to_string(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "alias_allowed");
        assert_eq!(json["address"], "bob@example.org");
        assert_eq!(json["alias"], "sales@example.org");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_names_match_serde_tags() {
        let kinds = [
            EventKind::UserCreated,
            EventKind::CredentialChanged,
            EventKind::AliasDisabled,
            EventKind::AliasDeleted { detached: vec![] },
        ];
        for kind in kinds {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json["event"], kind.name());
        }
    }
}
