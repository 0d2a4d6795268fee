//! mailadm configuration file handling
//!
//! Loads and saves the ~/.config/mailadm/config.yaml file.

use crate::account::{DnPattern, ManagerSettings};
use crate::credential::CryptScheme;
use crate::Result;
use mail_directory::ConnectOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Server URI (ldap://, ldaps:// or ldapi://)
    pub uri: String,

    /// Search base for every account lookup
    pub base: String,

    /// DN to bind as; anonymous when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl LdapConfig {
    pub fn new(uri: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            base: base.into(),
            bind_dn: None,
            bind_password: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_bind(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self.bind_password = Some(password.into());
        self
    }

    /// Connection parameters for the directory client
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            uri: self.uri.clone(),
            bind_dn: self.bind_dn.clone(),
            bind_password: self.bind_password.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// mailadm configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAdmConfig {
    pub ldap: LdapConfig,

    /// Naming pattern for user entries
    pub user_dn_pattern: DnPattern,

    /// Naming pattern for alias entries
    pub alias_dn_pattern: DnPattern,

    /// Algorithm for newly hashed credentials
    #[serde(default)]
    pub credential_scheme: CryptScheme,
}

impl MailAdmConfig {
    pub fn new(
        ldap: LdapConfig,
        user_dn_pattern: impl Into<DnPattern>,
        alias_dn_pattern: impl Into<DnPattern>,
    ) -> Self {
        Self {
            ldap,
            user_dn_pattern: user_dn_pattern.into(),
            alias_dn_pattern: alias_dn_pattern.into(),
            credential_scheme: CryptScheme::default(),
        }
    }

    /// Load configuration from the default path (~/.config/mailadm/config.yaml)
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        Self::load(&path)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::MailAdmError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading mailadm configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            uri = %config.ldap.uri,
            base = %config.ldap.base,
            scheme = %config.credential_scheme,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving mailadm configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/mailadm/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("mailadm");
        path.push("config.yaml");
        path
    }

    /// Settings the account manager needs
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            base: self.ldap.base.clone(),
            user_dn_pattern: self.user_dn_pattern.clone(),
            alias_dn_pattern: self.alias_dn_pattern.clone(),
        }
    }
}
