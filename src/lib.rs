//! mailadm - mail account and alias administration over LDAP
//!
//! Mail users and aliases live as entries in a directory. Each address
//! resolves to exactly one kind of entry (user, alias, list, external) or
//! to nothing, and every administrative change is a guarded transition on
//! that status.
//!
//! # Architecture
//!
//! - **address**: parsing and validating `local@domain` addresses
//! - **account**: status resolution and the user/alias state machine
//! - **credential**: one-way hashing of user secrets
//! - **config**: YAML configuration and its validation
//! - **logging**: tracing subscriber setup
//!
//! The directory client itself lives in the `mail-directory` crate.
//!
//! # Example
//!
//! ```
//! use mail_directory::MemoryDirectory;
//! use mailadm::account::{AccountManager, ManagerSettings, Status};
//!
//! let settings = ManagerSettings {
//!     base: "dc=example,dc=org".to_string(),
//!     user_dn_pattern: "uid={0},ou=users,dc={3},dc={2}".into(),
//!     alias_dn_pattern: "mail={0}@{1},ou=aliases,dc={3},dc={2}".into(),
//! };
//! let mut manager = AccountManager::new(MemoryDirectory::new(), settings);
//!
//! manager.create_alias("sales@example.org")?;
//! assert_eq!(manager.status("sales@example.org")?, Status::Alias);
//! # Ok::<(), mailadm::MailAdmError>(())
//! ```

pub mod account;
pub mod address;
pub mod config;
pub mod credential;
pub mod error;
pub mod logging;

pub use error::{MailAdmError, Result};
