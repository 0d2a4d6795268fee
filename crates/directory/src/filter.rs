//! Search filters
//!
//! Filters are built as values, rendered to RFC 4515 text for LDAP and
//! evaluated directly by the in-memory backend.

use crate::Entry;
use std::fmt;

/// A directory search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equals { attribute: String, value: String },
    Present { attribute: String },
}

impl Filter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn negate(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Evaluate the filter against an entry
    ///
    /// Equality uses ASCII case-insensitive matching, which is what the
    /// mail and objectClass attributes use on a real server.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Filter::Not(filter) => !filter.matches(entry),
            Filter::Equals { attribute, value } => entry.has_value(attribute, value),
            Filter::Present { attribute } => !entry.values(attribute).is_empty(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(filters) => {
                write!(f, "(&")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                write!(f, ")")
            }
            Filter::Or(filters) => {
                write!(f, "(|")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                write!(f, ")")
            }
            Filter::Not(filter) => write!(f, "(!{})", filter),
            Filter::Equals { attribute, value } => {
                write!(f, "({}={})", attribute, escape_filter_value(value))
            }
            Filter::Present { attribute } => write!(f, "({}=*)", attribute),
        }
    }
}

/// Escape a value for use inside a filter (RFC 4515)
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Escape a value for use as an RDN attribute value (RFC 4514)
pub fn escape_dn_value(value: &str) -> String {
    let count = value.chars().count();
    let mut result = String::with_capacity(value.len() * 2);

    for (i, ch) in value.chars().enumerate() {
        let is_first = i == 0;
        let is_last = i + 1 == count;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if is_first || is_last => result.push_str("\\20"),
            '#' if is_first => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_equals() {
        let filter = Filter::equals("mail", "bob@example.org");
        assert_eq!(filter.to_string(), "(mail=bob@example.org)");
    }

    #[test]
    fn test_render_nested() {
        let filter = Filter::and([
            Filter::equals("objectClass", "mailUser"),
            Filter::equals("aliasAddress", "sales@example.org"),
        ]);
        assert_eq!(
            filter.to_string(),
            "(&(objectClass=mailUser)(aliasAddress=sales@example.org))"
        );

        let filter = Filter::or([Filter::present("mail"), Filter::negate(Filter::present("cn"))]);
        assert_eq!(filter.to_string(), "(|(mail=*)(!(cn=*)))");
    }

    #[test]
    fn test_render_escapes_values() {
        let filter = Filter::equals("mail", "*)(uid=*");
        assert_eq!(filter.to_string(), "(mail=\\2a\\29\\28uid=\\2a)");
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("John Doe"), "John Doe");
        assert_eq!(escape_filter_value("John*"), "John\\2a");
        assert_eq!(escape_filter_value("(admin)"), "\\28admin\\29");
        assert_eq!(escape_filter_value("a\\b"), "a\\5cb");
    }

    #[test]
    fn test_escape_dn_value() {
        assert_eq!(escape_dn_value("bob"), "bob");
        assert_eq!(escape_dn_value("a,b"), "a\\,b");
        assert_eq!(escape_dn_value("bob+tag"), "bob\\+tag");
        assert_eq!(escape_dn_value(" bob "), "\\20bob\\20");
        assert_eq!(escape_dn_value("#bob"), "\\23bob");
        assert_eq!(escape_dn_value("b#b"), "b#b");
        assert_eq!(escape_dn_value(""), "");
    }

    #[test]
    fn test_matches() {
        let entry = Entry::new("uid=bob,dc=example,dc=org")
            .with_attr("objectClass", ["mailUser"])
            .with_attr("aliasAddress", ["sales@example.org"]);

        assert!(Filter::equals("objectclass", "MailUser").matches(&entry));
        assert!(Filter::and([
            Filter::equals("objectClass", "mailUser"),
            Filter::equals("aliasAddress", "sales@example.org"),
        ])
        .matches(&entry));
        assert!(!Filter::equals("aliasAddress", "info@example.org").matches(&entry));
        assert!(Filter::or([
            Filter::equals("aliasAddress", "info@example.org"),
            Filter::present("objectClass"),
        ])
        .matches(&entry));
        assert!(Filter::negate(Filter::present("mail")).matches(&entry));
    }
}
