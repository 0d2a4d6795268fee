//! Error types for mailadm
//!
//! One enum covers every failure the account core can report. Directory
//! errors are carried through untouched.

use crate::account::{DnPatternError, Status};
use crate::address::AddressError;
use thiserror::Error;

/// Result type alias for mailadm operations
pub type Result<T> = std::result::Result<T, MailAdmError>;

#[derive(Error, Debug)]
pub enum MailAdmError {
    /// Malformed mail address
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The address is in a status the operation cannot start from
    #[error("\"{address}\" is {actual}, expected {expected}")]
    InvalidState {
        address: String,
        actual: Status,
        expected: Status,
    },

    /// The target is already in the requested state
    #[error("Nothing to do for \"{address}\": {reason}")]
    RedundantOperation { address: String, reason: String },

    /// The credential hasher produced no output
    #[error("Could not hash credential")]
    CredentialHashFailure,

    /// Failure reported by the directory client
    #[error("Directory error: {0}")]
    Directory(#[from] mail_directory::Error),

    /// A naming pattern could not be applied to an address
    #[error("Distinguished name pattern error: {0}")]
    DnPattern(#[from] DnPatternError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl MailAdmError {
    pub(crate) fn invalid_state(address: &str, actual: Status, expected: Status) -> Self {
        MailAdmError::InvalidState {
            address: address.to_string(),
            actual,
            expected,
        }
    }

    pub(crate) fn redundant(address: &str, reason: impl Into<String>) -> Self {
        MailAdmError::RedundantOperation {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the operation had nothing to do; callers usually log this
    /// and carry on
    pub fn is_redundant(&self) -> bool {
        matches!(self, MailAdmError::RedundantOperation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_display() {
        let err = MailAdmError::invalid_state("bob@example.org", Status::Alias, Status::User);
        assert_eq!(
            err.to_string(),
            "\"bob@example.org\" is alias, expected user"
        );
        assert!(!err.is_redundant());
    }

    #[test]
    fn test_redundant() {
        let err = MailAdmError::redundant("bob@example.org", "already a user");
        assert!(err.is_redundant());
        assert_eq!(
            err.to_string(),
            "Nothing to do for \"bob@example.org\": already a user"
        );
    }

    #[test]
    fn test_from_directory_error() {
        let err: MailAdmError = mail_directory::Error::Closed.into();
        assert!(matches!(err, MailAdmError::Directory(_)));
        assert_eq!(err.to_string(), "Directory error: Directory connection is closed");
    }
}
