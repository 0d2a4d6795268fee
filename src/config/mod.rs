//! Configuration system
//!
//! Loads ~/.config/mailadm/config.yaml with:
//! - LDAP connection settings (URI, base, optional bind credentials)
//! - Naming patterns for user and alias entries
//! - The credential hashing scheme

mod mailadm_config;
pub mod validation;

pub use mailadm_config::{LdapConfig, MailAdmConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};
