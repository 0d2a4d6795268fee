//! Mail address tokenizing
//!
//! Splits an `addr-spec` into the fields the directory naming patterns
//! consume: the local part, the domain, and the domain labels in reverse
//! order so hierarchical names can be built most-significant label first.
//!
//! # Examples
//!
//! ```
//! use mailadm::address::tokenize;
//!
//! let addr = tokenize("a@b.example.org").unwrap();
//! assert_eq!(addr.local(), "a");
//! assert_eq!(addr.domain(), "b.example.org");
//! assert_eq!(addr.labels_reversed(), vec!["org", "example", "b"]);
//! assert_eq!(addr.fields(), vec!["a", "b.example.org", "org", "example", "b"]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Error type for address parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address format: expected 'local@domain', got '{0}'")]
    InvalidFormat(String),

    #[error("address local part cannot be empty")]
    EmptyLocal,

    #[error("address domain cannot be empty")]
    EmptyDomain,

    #[error("address local part is too long: '{0}'")]
    LocalTooLong(String),

    #[error("address domain is too long: '{0}'")]
    DomainTooLong(String),

    #[error("address local part contains invalid characters: '{0}'")]
    InvalidLocal(String),

    #[error("address domain is not a valid host name: '{0}'")]
    InvalidDomain(String),
}

/// A syntactically valid mail address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    local: String,
    domain: String,
}

/// Parse an address into its naming fields
pub fn tokenize(address: &str) -> Result<Address, AddressError> {
    address.parse()
}

impl Address {
    /// Create an address from parts
    ///
    /// # Errors
    /// Returns an error if either part is empty, too long, or malformed.
    pub fn new(local: impl Into<String>, domain: impl Into<String>) -> Result<Self, AddressError> {
        let local = local.into();
        let domain = domain.into();

        Self::validate_local(&local)?;
        Self::validate_domain(&domain)?;

        Ok(Self { local, domain })
    }

    /// The part before the `@`
    pub fn local(&self) -> &str {
        &self.local
    }

    /// The part after the `@`
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Domain labels, top-level label first
    pub fn labels_reversed(&self) -> Vec<&str> {
        self.domain.rsplit('.').collect()
    }

    /// Positional naming fields: `[local, domain, label_n, ..., label_1]`
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.local.as_str(), self.domain.as_str()];
        fields.extend(self.labels_reversed());
        fields
    }

    /// Dot-atom local part (RFC 5322 atext separated by single dots)
    fn validate_local(local: &str) -> Result<(), AddressError> {
        if local.is_empty() {
            return Err(AddressError::EmptyLocal);
        }

        if local.len() > MAX_LOCAL_LEN {
            return Err(AddressError::LocalTooLong(local.to_string()));
        }

        if local.split('.').any(|atom| atom.is_empty() || !atom.chars().all(is_atext)) {
            return Err(AddressError::InvalidLocal(local.to_string()));
        }

        Ok(())
    }

    /// Host name made of LDH labels
    fn validate_domain(domain: &str) -> Result<(), AddressError> {
        if domain.is_empty() {
            return Err(AddressError::EmptyDomain);
        }

        if domain.len() > MAX_DOMAIN_LEN {
            return Err(AddressError::DomainTooLong(domain.to_string()));
        }

        let valid_label = |label: &str| {
            !label.is_empty()
                && label.len() <= MAX_LABEL_LEN
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        };

        if !domain.split('.').all(valid_label) {
            return Err(AddressError::InvalidDomain(domain.to_string()));
        }

        Ok(())
    }
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('@').collect();

        if parts.len() != 2 {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }

        Self::new(parts[0], parts[1])
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}
