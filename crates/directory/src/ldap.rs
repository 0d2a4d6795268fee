//! LDAP backend over a blocking `ldap3` connection

use crate::{Directory, Entry, Error, Filter, ModOp, Modification, Result, Scope};
use ldap3::{LdapConn, LdapConnSettings, LdapResult, Mod, SearchEntry};
use std::collections::HashSet;
use std::time::Duration;

// LDAP result codes we translate into typed errors
const RC_NO_SUCH_ATTRIBUTE: u32 = 16;
const RC_ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;
const RC_NO_SUCH_OBJECT: u32 = 32;
const RC_ENTRY_ALREADY_EXISTS: u32 = 68;

/// Connection parameters for [`LdapDirectory::connect`]
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub uri: String,
    pub bind_dn: Option<String>,
    pub bind_password: Option<String>,
    pub timeout: Duration,
}

impl ConnectOptions {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            bind_dn: None,
            bind_password: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_bind(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self.bind_password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A single bound connection to an LDAP server
pub struct LdapDirectory {
    conn: Option<LdapConn>,
    uri: String,
}

impl LdapDirectory {
    /// Open a connection and, when credentials are configured, bind with them
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        tracing::debug!(uri = %options.uri, "Opening LDAP connection");

        let settings = LdapConnSettings::new().set_conn_timeout(options.timeout);
        let mut conn = LdapConn::with_settings(settings, &options.uri)?;

        if let Some(bind_dn) = &options.bind_dn {
            tracing::debug!(bind_dn = %bind_dn, "Binding to LDAP server");
            let password = options.bind_password.as_deref().unwrap_or_default();
            conn.simple_bind(bind_dn, password)?.success()?;
        } else {
            tracing::debug!("No bind DN configured, using anonymous access");
        }

        tracing::info!(uri = %options.uri, "Connected to LDAP server");

        Ok(Self {
            conn: Some(conn),
            uri: options.uri.clone(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&mut self) -> Result<&mut LdapConn> {
        self.conn.as_mut().ok_or(Error::Closed)
    }
}

impl Directory for LdapDirectory {
    fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &Filter,
        attrs: &[&str],
    ) -> Result<Vec<Entry>> {
        let filter = filter.to_string();
        tracing::debug!(base = %base, filter = %filter, "LDAP search");

        let (entries, _res) = self
            .conn()?
            .search(base, scope.into(), &filter, attrs.to_vec())?
            .success()?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let entry = SearchEntry::construct(entry);
                Entry {
                    dn: entry.dn,
                    attrs: entry.attrs.into_iter().collect(),
                }
            })
            .collect())
    }

    fn add(&mut self, dn: &str, attrs: Vec<(String, Vec<String>)>) -> Result<()> {
        tracing::debug!(dn = %dn, "LDAP add");

        let attrs: Vec<(String, HashSet<String>)> = attrs
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect();
        let res = self.conn()?.add(dn, attrs)?;
        check(res, dn, None)
    }

    fn delete(&mut self, dn: &str) -> Result<()> {
        tracing::debug!(dn = %dn, "LDAP delete");

        let res = self.conn()?.delete(dn)?;
        check(res, dn, None)
    }

    fn modify(&mut self, dn: &str, mods: Vec<Modification>) -> Result<()> {
        tracing::debug!(dn = %dn, count = mods.len(), "LDAP modify");

        // Only a single-modification request can be blamed on one value
        let subject = match mods.as_slice() {
            [single] => Some(single.clone()),
            _ => None,
        };

        let mods: Vec<Mod<String>> = mods
            .into_iter()
            .map(|m| {
                let values = HashSet::from([m.value]);
                match m.op {
                    ModOp::Add => Mod::Add(m.attribute, values),
                    ModOp::Replace => Mod::Replace(m.attribute, values),
                    ModOp::Delete => Mod::Delete(m.attribute, values),
                }
            })
            .collect();

        let res = self.conn()?.modify(dn, mods)?;
        check(res, dn, subject.as_ref())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            tracing::debug!(uri = %self.uri, "Unbinding from LDAP server");
            conn.unbind()?;
        }
        Ok(())
    }
}

impl From<Scope> for ldap3::Scope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Base => ldap3::Scope::Base,
            Scope::OneLevel => ldap3::Scope::OneLevel,
            Scope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// Turn a non-success LDAP result into a typed error where we can
fn check(res: LdapResult, dn: &str, subject: Option<&Modification>) -> Result<()> {
    match (res.rc, subject) {
        (0, _) => Ok(()),
        (RC_ENTRY_ALREADY_EXISTS, _) => Err(Error::AlreadyExists(dn.to_string())),
        (RC_NO_SUCH_OBJECT, _) => Err(Error::NoSuchEntry(dn.to_string())),
        (RC_ATTRIBUTE_OR_VALUE_EXISTS, Some(m)) => Err(Error::ValueExists {
            dn: dn.to_string(),
            attribute: m.attribute.clone(),
            value: m.value.clone(),
        }),
        (RC_NO_SUCH_ATTRIBUTE, Some(m)) => Err(Error::NoSuchValue {
            dn: dn.to_string(),
            attribute: m.attribute.clone(),
            value: m.value.clone(),
        }),
        _ => res.success().map(|_| ()).map_err(Error::from),
    }
}
