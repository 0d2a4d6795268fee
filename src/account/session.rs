//! Connected sessions
//!
//! Builds an [`AccountManager`] over a live LDAP connection from a loaded
//! configuration, and runs scoped work against it.

use super::manager::AccountManager;
use crate::config::{validate_config_result, MailAdmConfig};
use crate::credential::CryptHasher;
use crate::Result;
use mail_directory::LdapDirectory;

/// Validate `config`, connect and bind to the directory, and return a
/// manager over that connection
///
/// The caller owns the connection; call [`AccountManager::close`] (or use
/// [`with_session`]) to unbind.
pub fn connect(config: &MailAdmConfig) -> Result<AccountManager<LdapDirectory>> {
    validate_config_result(config)?;

    tracing::debug!(
        uri = %config.ldap.uri,
        anonymous = config.ldap.bind_dn.is_none(),
        "Connecting to directory"
    );

    let directory = LdapDirectory::connect(&config.ldap.connect_options())?;

    tracing::info!(uri = %config.ldap.uri, base = %config.ldap.base, "Directory session opened");

    Ok(AccountManager::new(directory, config.manager_settings())
        .with_hasher(CryptHasher::new(config.credential_scheme)))
}

/// Connect, run `f`, and unbind whatever `f` returned
pub fn with_session<T>(
    config: &MailAdmConfig,
    f: impl FnOnce(&mut AccountManager<LdapDirectory>) -> Result<T>,
) -> Result<T> {
    let manager = connect(config)?;
    let result = manager.run_scoped(f);

    match &result {
        Ok(_) => tracing::info!(uri = %config.ldap.uri, "Directory session closed"),
        Err(e) => tracing::warn!(uri = %config.ldap.uri, error = %e, "Directory session ended with error"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LdapConfig;
    use crate::MailAdmError;

    #[test]
    fn test_connect_rejects_invalid_config() {
        crate::logging::init_test();

        let config = MailAdmConfig::new(
            LdapConfig::new("http://localhost", "dc=example,dc=org"),
            "uid={0},ou=users,dc={3},dc={2}",
            "mail={0}@{1},ou=aliases,dc={3},dc={2}",
        );

        let result = connect(&config);
        assert!(matches!(result, Err(MailAdmError::Config(_))));
    }

    #[test]
    fn test_with_session_does_not_run_closure_on_connect_failure() {
        let config = MailAdmConfig::new(
            LdapConfig::new("ldap://localhost", ""),
            "uid={0},ou=users,dc={3},dc={2}",
            "mail={0}@{1},ou=aliases,dc={3},dc={2}",
        );

        let mut ran = false;
        let result = with_session(&config, |_| {
            ran = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(!ran);
    }

    #[test]
    #[ignore = "requires a running LDAP server at ldap://localhost"]
    fn test_live_session_status() {
        let config = MailAdmConfig::new(
            LdapConfig::new("ldap://localhost", "dc=example,dc=org"),
            "uid={0},ou=users,dc={3},dc={2}",
            "mail={0}@{1},ou=aliases,dc={3},dc={2}",
        );

        let status = with_session(&config, |manager| manager.status("nobody@example.org")).unwrap();
        assert_eq!(status, crate::account::Status::Absent);
    }
}
