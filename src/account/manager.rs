//! Account manager
//!
//! The state machine over mail users and aliases. Every mutation resolves
//! the current status of its target, checks that the transition is legal,
//! computes derived values (credential hash, DN, membership expression) and
//! then writes to the directory.
//!
//! | Operation | Requires | Redundant when |
//! |---|---|---|
//! | `create_user` / `create_alias` | absent | already that kind |
//! | `delete_user` / `delete_alias` | that kind | absent |
//! | `set_*_enabled` | that kind | flag already set |
//! | `allow` / `deny` | user + alias | already (not) allow-listed |
//! | `change_credential` | user | never |
//!
//! The manager does not log. Successful mutations return an [`Event`].
//!
//! Writes are not atomic with respect to other managers working on the same
//! directory: `allow`/`deny` act on a snapshot taken moments before the
//! write, and `delete_alias` detaches users one by one before removing the
//! alias, so a failure part-way leaves the earlier users detached.

use super::cache::LookupCache;
use super::dn::DnPattern;
use super::events::{Event, EventKind};
use super::resolver;
use super::schema::{
    self, ATTR_ACCOUNT_STATUS, ATTR_ALIAS_ADDRESS, ATTR_MAIL, ATTR_MEMBER_URL,
    ATTR_OBJECT_CLASS, ATTR_PASSWORD, CLASS_ALIAS, CLASS_USER,
};
use super::status::{Resolution, Snapshot, Status};
use crate::address::{tokenize, Address};
use crate::credential::{CredentialHasher, CryptHasher};
use crate::{MailAdmError, Result};
use mail_directory::{Directory, Entry, Modification, Scope};

/// Where accounts live and how their entries are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Search base for all lookups
    pub base: String,
    pub user_dn_pattern: DnPattern,
    pub alias_dn_pattern: DnPattern,
}

pub struct AccountManager<D: Directory> {
    directory: D,
    settings: ManagerSettings,
    hasher: Box<dyn CredentialHasher>,
    cache: LookupCache,
}

impl<D: Directory> AccountManager<D> {
    /// Create a manager that hashes credentials with bcrypt
    pub fn new(directory: D, settings: ManagerSettings) -> Self {
        Self {
            directory,
            settings,
            hasher: Box::new(CryptHasher::default()),
            cache: LookupCache::new(),
        }
    }

    pub fn with_hasher(mut self, hasher: impl CredentialHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Resolve an address, refreshing the lookup cache on a unique match
    pub fn resolve(&mut self, address: &str) -> Result<Resolution> {
        resolver::resolve(
            &mut self.directory,
            &self.settings.base,
            &mut self.cache,
            address,
        )
    }

    pub fn status(&mut self, address: &str) -> Result<Status> {
        self.resolve(address).map(|r| r.status)
    }

    /// Last snapshot resolved for an address in this manager's lifetime
    ///
    /// This may be out of date; nothing here re-reads or invalidates it.
    pub fn last_snapshot(&self, address: &str) -> Option<&Snapshot> {
        self.cache.get(address)
    }

    // Users

    pub fn create_user(&mut self, address: &str, secret: &str) -> Result<Event> {
        let addr = self.require_absent(address, Status::User)?;
        let credential = self.credential(secret)?;
        let dn = self.settings.user_dn_pattern.render(&addr)?;

        self.directory.add(
            &dn,
            vec![
                attr(ATTR_OBJECT_CLASS, CLASS_USER),
                attr(ATTR_MAIL, address),
                attr(ATTR_PASSWORD, &credential),
            ],
        )?;

        Ok(Event::new(address, dn, EventKind::UserCreated))
    }

    pub fn delete_user(&mut self, address: &str) -> Result<Event> {
        let (addr, _) = self.require_present(address, Status::User)?;
        let dn = self.settings.user_dn_pattern.render(&addr)?;

        self.directory.delete(&dn)?;

        Ok(Event::new(address, dn, EventKind::UserDeleted))
    }

    pub fn set_user_enabled(&mut self, address: &str, enabled: bool) -> Result<Event> {
        let (addr, snapshot) = self.require(address, Status::User)?;
        let dn = self.settings.user_dn_pattern.render(&addr)?;
        self.write_enabled(&snapshot, &dn, enabled)?;

        let kind = if enabled {
            EventKind::UserEnabled
        } else {
            EventKind::UserDisabled
        };
        Ok(Event::new(address, dn, kind))
    }

    pub fn enable_user(&mut self, address: &str) -> Result<Event> {
        self.set_user_enabled(address, true)
    }

    pub fn disable_user(&mut self, address: &str) -> Result<Event> {
        self.set_user_enabled(address, false)
    }

    /// Replace a user's credential; always writes, even for the same secret
    pub fn change_credential(&mut self, address: &str, secret: &str) -> Result<Event> {
        let (addr, _) = self.require(address, Status::User)?;
        let credential = self.credential(secret)?;
        let dn = self.settings.user_dn_pattern.render(&addr)?;

        self.directory
            .modify(&dn, vec![Modification::replace(ATTR_PASSWORD, credential)])?;

        Ok(Event::new(address, dn, EventKind::CredentialChanged))
    }

    // Aliases

    pub fn create_alias(&mut self, address: &str) -> Result<Event> {
        let addr = self.require_absent(address, Status::Alias)?;
        let member_url = schema::member_url(&self.settings.base, address);
        let dn = self.settings.alias_dn_pattern.render(&addr)?;

        self.directory.add(
            &dn,
            vec![
                attr(ATTR_OBJECT_CLASS, CLASS_ALIAS),
                attr(ATTR_MAIL, address),
                attr(ATTR_MEMBER_URL, &member_url),
            ],
        )?;

        Ok(Event::new(address, dn, EventKind::AliasCreated { member_url }))
    }

    /// Delete an alias after removing it from every allow-list that has it
    pub fn delete_alias(&mut self, address: &str) -> Result<Event> {
        let (addr, _) = self.require_present(address, Status::Alias)?;
        // A bad pattern must fail before any user is detached
        let dn = self.settings.alias_dn_pattern.render(&addr)?;

        let mut detached = Vec::new();
        for user in self.allow_listing(address)? {
            self.directory.modify(
                &user.dn,
                vec![Modification::delete(ATTR_ALIAS_ADDRESS, address)],
            )?;
            detached.push(user.dn);
        }

        self.directory.delete(&dn)?;

        Ok(Event::new(address, dn, EventKind::AliasDeleted { detached }))
    }

    pub fn set_alias_enabled(&mut self, address: &str, enabled: bool) -> Result<Event> {
        let (addr, snapshot) = self.require(address, Status::Alias)?;
        let dn = self.settings.alias_dn_pattern.render(&addr)?;
        self.write_enabled(&snapshot, &dn, enabled)?;

        let kind = if enabled {
            EventKind::AliasEnabled
        } else {
            EventKind::AliasDisabled
        };
        Ok(Event::new(address, dn, kind))
    }

    pub fn enable_alias(&mut self, address: &str) -> Result<Event> {
        self.set_alias_enabled(address, true)
    }

    pub fn disable_alias(&mut self, address: &str) -> Result<Event> {
        self.set_alias_enabled(address, false)
    }

    /// Addresses of the users currently allow-listing an alias, i.e. the
    /// evaluated membership expression
    pub fn alias_members(&mut self, alias: &str) -> Result<Vec<String>> {
        self.require(alias, Status::Alias)?;

        Ok(self
            .allow_listing(alias)?
            .into_iter()
            .filter_map(|user| user.first(ATTR_MAIL).map(str::to_string))
            .collect())
    }

    // Relationships

    /// Add an alias to a user's allow-list
    pub fn allow(&mut self, user: &str, alias: &str) -> Result<Event> {
        let (_, snapshot) = self.require(user, Status::User)?;
        self.allow_with(&snapshot, alias)
    }

    /// Remove an alias from a user's allow-list
    pub fn deny(&mut self, user: &str, alias: &str) -> Result<Event> {
        let (_, snapshot) = self.require(user, Status::User)?;
        self.deny_with(&snapshot, alias)
    }

    /// [`allow`](Self::allow) deciding redundancy from a snapshot the caller
    /// already holds instead of a fresh lookup of the user
    pub fn allow_with(&mut self, user: &Snapshot, alias: &str) -> Result<Event> {
        let dn = self.relationship_target(user, alias)?;

        if user.allows(alias) {
            return Err(MailAdmError::redundant(
                user.address(),
                format!("\"{}\" is already allowed", alias),
            ));
        }

        self.directory
            .modify(&dn, vec![Modification::add(ATTR_ALIAS_ADDRESS, alias)])?;

        Ok(Event::new(
            user.address(),
            dn,
            EventKind::AliasAllowed {
                alias: alias.to_string(),
            },
        ))
    }

    /// [`deny`](Self::deny) deciding redundancy from a snapshot the caller
    /// already holds instead of a fresh lookup of the user
    pub fn deny_with(&mut self, user: &Snapshot, alias: &str) -> Result<Event> {
        let dn = self.relationship_target(user, alias)?;

        if !user.allows(alias) {
            return Err(MailAdmError::redundant(
                user.address(),
                format!("\"{}\" is not allowed", alias),
            ));
        }

        self.directory
            .modify(&dn, vec![Modification::delete(ATTR_ALIAS_ADDRESS, alias)])?;

        Ok(Event::new(
            user.address(),
            dn,
            EventKind::AliasDenied {
                alias: alias.to_string(),
            },
        ))
    }

    /// Release the directory connection
    pub fn close(mut self) -> Result<()> {
        self.directory.close()?;
        Ok(())
    }

    /// Run `f` against this manager and close the connection afterwards,
    /// whether or not `f` succeeded
    ///
    /// An error from `f` takes precedence over an error while closing.
    pub fn run_scoped<T>(mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = f(&mut self);
        let closed = self.close();

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), _) => Err(e),
        }
    }

    // Helpers

    /// Require `expected`; anything else, including absent, is invalid
    fn require(&mut self, address: &str, expected: Status) -> Result<(Address, Snapshot)> {
        let addr = tokenize(address)?;
        let resolution = self.resolve(address)?;

        match (resolution.status, resolution.snapshot) {
            (status, Some(snapshot)) if status == expected => Ok((addr, snapshot)),
            (status, _) => Err(MailAdmError::invalid_state(address, status, expected)),
        }
    }

    /// Like [`require`](Self::require), but an absent address is redundant
    /// (used by deletions)
    fn require_present(&mut self, address: &str, expected: Status) -> Result<(Address, Snapshot)> {
        match self.require(address, expected) {
            Err(MailAdmError::InvalidState {
                actual: Status::Absent,
                ..
            }) => Err(MailAdmError::redundant(
                address,
                format!("no {} with this address", expected),
            )),
            other => other,
        }
    }

    /// Require an absent address; `target` already present is redundant
    fn require_absent(&mut self, address: &str, target: Status) -> Result<Address> {
        let addr = tokenize(address)?;

        match self.resolve(address)?.status {
            Status::Absent => Ok(addr),
            status if status == target => Err(MailAdmError::redundant(
                address,
                format!("already a {}", target),
            )),
            status => Err(MailAdmError::invalid_state(address, status, Status::Absent)),
        }
    }

    /// Check both ends of an allow/deny and return the user's DN
    fn relationship_target(&mut self, user: &Snapshot, alias: &str) -> Result<String> {
        let user_status = resolver::classify(user.entry());
        if user_status != Status::User {
            return Err(MailAdmError::invalid_state(
                user.address(),
                user_status,
                Status::User,
            ));
        }
        let addr = tokenize(user.address())?;

        self.require(alias, Status::Alias)?;

        Ok(self.settings.user_dn_pattern.render(&addr)?)
    }

    fn write_enabled(&mut self, snapshot: &Snapshot, dn: &str, enabled: bool) -> Result<()> {
        if snapshot.is_enabled() == enabled {
            return Err(MailAdmError::redundant(
                snapshot.address(),
                if enabled {
                    "already enabled"
                } else {
                    "already disabled"
                },
            ));
        }

        self.directory.modify(
            dn,
            vec![Modification::replace(
                ATTR_ACCOUNT_STATUS,
                schema::status_value(enabled),
            )],
        )?;
        Ok(())
    }

    /// Users whose allow-list contains `alias`, found by query rather than
    /// by address
    fn allow_listing(&mut self, alias: &str) -> Result<Vec<Entry>> {
        Ok(self.directory.search(
            &self.settings.base,
            Scope::Subtree,
            &schema::allow_listing(alias),
            &[ATTR_MAIL],
        )?)
    }

    /// Hash a secret into its stored, scheme-tagged form
    fn credential(&self, secret: &str) -> Result<String> {
        let hash = self.hasher.hash(secret);
        if hash.is_empty() {
            return Err(MailAdmError::CredentialHashFailure);
        }
        Ok(format!("{}{}", self.hasher.scheme(), hash))
    }
}

fn attr(name: &str, value: &str) -> (String, Vec<String>) {
    (name.to_string(), vec![value.to_string()])
}
