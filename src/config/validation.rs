//! Configuration validation
//!
//! Checks a loaded configuration before any connection is made:
//! - Required keys are present and non-empty
//! - The LDAP URI uses a known scheme
//! - Bind DN and password come together
//!
//! Naming patterns are not checked against addresses here; a pattern that
//! asks for more fields than an address has fails when it is first used.

use super::mailadm_config::MailAdmConfig;
use crate::MailAdmError;

const LDAP_SCHEMES: [&str; 3] = ["ldap://", "ldaps://", "ldapi://"];

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a mailadm configuration
pub fn validate_config(config: &MailAdmConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let required = [
        ("ldap.uri", config.ldap.uri.as_str()),
        ("ldap.base", config.ldap.base.as_str()),
        ("user_dn_pattern", config.user_dn_pattern.as_str()),
        ("alias_dn_pattern", config.alias_dn_pattern.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Required key is empty"));
        }
    }

    let uri = config.ldap.uri.to_ascii_lowercase();
    if !uri.is_empty() && !LDAP_SCHEMES.iter().any(|s| uri.starts_with(s)) {
        errors.push(ValidationError::new(
            "ldap.uri",
            format!(
                "Invalid LDAP URI '{}'. Must start with one of: {}",
                config.ldap.uri,
                LDAP_SCHEMES.join(", ")
            ),
        ));
    }

    if config.ldap.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "ldap.timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    match (&config.ldap.bind_dn, &config.ldap.bind_password) {
        (Some(_), Some(_)) => {}
        (None, None) => {
            tracing::info!("No bind credentials configured, binding anonymously");
        }
        (Some(_), None) => errors.push(ValidationError::new(
            "ldap.bind_password",
            "bind_dn is set but bind_password is missing",
        )),
        (None, Some(_)) => errors.push(ValidationError::new(
            "ldap.bind_dn",
            "bind_password is set but bind_dn is missing",
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &MailAdmConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        MailAdmError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
