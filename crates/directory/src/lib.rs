//! Directory client for mail account administration
//!
//! A small, blocking interface to a hierarchical directory service (LDAP).
//! Callers search entries by attribute filter and mutate them by
//! distinguished name with whole-entry add/delete and attribute-level
//! modifications.
//!
//! # Example
//!
//! ```
//! use mail_directory::{Directory, Filter, MemoryDirectory, Scope};
//!
//! let mut dir = MemoryDirectory::new();
//! dir.add(
//!     "uid=bob,ou=users,dc=example,dc=org",
//!     vec![
//!         ("objectClass".to_string(), vec!["mailUser".to_string()]),
//!         ("mail".to_string(), vec!["bob@example.org".to_string()]),
//!     ],
//! )?;
//!
//! let found = dir.search(
//!     "dc=example,dc=org",
//!     Scope::Subtree,
//!     &Filter::equals("mail", "bob@example.org"),
//!     &["objectClass"],
//! )?;
//! assert_eq!(found.len(), 1);
//! # Ok::<(), mail_directory::Error>(())
//! ```

mod filter;
mod ldap;
mod memory;

pub use filter::{escape_dn_value, escape_filter_value, Filter};
pub use ldap::{ConnectOptions, LdapDirectory};
pub use memory::MemoryDirectory;

use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur when talking to the directory
#[derive(Error, Debug)]
pub enum Error {
    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("No such entry: {0}")]
    NoSuchEntry(String),

    #[error("Value '{value}' already present in attribute '{attribute}' of {dn}")]
    ValueExists {
        dn: String,
        attribute: String,
        value: String,
    },

    #[error("Value '{value}' not present in attribute '{attribute}' of {dn}")]
    NoSuchValue {
        dn: String,
        attribute: String,
        value: String,
    },

    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Directory connection is closed")]
    Closed,
}

/// Result type for directory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Search scope relative to the search base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the base entry itself
    Base,
    /// Immediate children of the base
    OneLevel,
    /// The base and everything below it
    Subtree,
}

/// Attribute-level modification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModOp {
    Add,
    Replace,
    Delete,
}

impl std::fmt::Display for ModOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModOp::Add => write!(f, "add"),
            ModOp::Replace => write!(f, "replace"),
            ModOp::Delete => write!(f, "delete"),
        }
    }
}

/// A single attribute modification: `(op, attribute, value)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub op: ModOp,
    pub attribute: String,
    pub value: String,
}

impl Modification {
    pub fn add(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ModOp::Add, attribute, value)
    }

    pub fn replace(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ModOp::Replace, attribute, value)
    }

    pub fn delete(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ModOp::Delete, attribute, value)
    }

    fn new(op: ModOp, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op,
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// A directory entry as returned by a search
///
/// Attribute names are looked up ASCII case-insensitively, matching how
/// LDAP servers treat attribute descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder-style attribute setter, mostly useful in tests
    pub fn with_attr<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attrs
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// All values of an attribute (empty if the attribute is missing)
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value of an attribute
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// Whether the attribute holds the given value (ASCII case-insensitive)
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.values(name)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Keep only the requested attributes; an empty request keeps everything
    pub(crate) fn project(&self, attrs: &[&str]) -> Self {
        if attrs.is_empty() {
            return self.clone();
        }

        Self {
            dn: self.dn.clone(),
            attrs: self
                .attrs
                .iter()
                .filter(|(key, _)| attrs.iter().any(|a| a.eq_ignore_ascii_case(key)))
                .map(|(key, values)| (key.clone(), values.clone()))
                .collect(),
        }
    }
}

/// A blocking connection to a directory service
///
/// Every call blocks until the directory answers. Implementations never
/// retry; any failure is returned to the caller as-is.
pub trait Directory {
    /// Search for entries below `base` matching `filter`, returning only
    /// the requested attributes (all of them when `attrs` is empty)
    fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &Filter,
        attrs: &[&str],
    ) -> Result<Vec<Entry>>;

    /// Add a new entry
    fn add(&mut self, dn: &str, attrs: Vec<(String, Vec<String>)>) -> Result<()>;

    /// Delete an entry
    fn delete(&mut self, dn: &str) -> Result<()>;

    /// Apply attribute-level modifications to an entry
    fn modify(&mut self, dn: &str, mods: Vec<Modification>) -> Result<()>;

    /// Release the connection; further calls fail with [`Error::Closed`]
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Lend a directory to a caller without giving up ownership
impl<D: Directory + ?Sized> Directory for &mut D {
    fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &Filter,
        attrs: &[&str],
    ) -> Result<Vec<Entry>> {
        (**self).search(base, scope, filter, attrs)
    }

    fn add(&mut self, dn: &str, attrs: Vec<(String, Vec<String>)>) -> Result<()> {
        (**self).add(dn, attrs)
    }

    fn delete(&mut self, dn: &str) -> Result<()> {
        (**self).delete(dn)
    }

    fn modify(&mut self, dn: &str, mods: Vec<Modification>) -> Result<()> {
        (**self).modify(dn, mods)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
