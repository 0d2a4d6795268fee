//! Directory schema used for mail accounts

use mail_directory::Filter;

pub const ATTR_OBJECT_CLASS: &str = "objectClass";
pub const ATTR_MAIL: &str = "mail";
pub const ATTR_PASSWORD: &str = "userPassword";
pub const ATTR_ALIAS_ADDRESS: &str = "aliasAddress";
pub const ATTR_ACCOUNT_STATUS: &str = "accountStatus";
pub const ATTR_MEMBER_URL: &str = "memberURL";
pub const ATTR_LIST_USER: &str = "listUser";
pub const ATTR_ALIAS_USER: &str = "aliasUser";

pub const CLASS_USER: &str = "mailUser";
pub const CLASS_ALIAS: &str = "mailAlias";
pub const CLASS_LIST: &str = "mailList";
pub const CLASS_EXTERNAL: &str = "externalUser";

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_DISABLED: &str = "disabled";

/// Attributes fetched when classifying an address. Never the credential.
pub const CLASSIFICATION_ATTRS: &[&str] = &[
    ATTR_OBJECT_CLASS,
    ATTR_MAIL,
    ATTR_ALIAS_ADDRESS,
    ATTR_ACCOUNT_STATUS,
    ATTR_LIST_USER,
    ATTR_ALIAS_USER,
];

/// Entries whose canonical address is `address`
pub fn by_address(address: &str) -> Filter {
    Filter::equals(ATTR_MAIL, address)
}

/// Users that allow-list `alias`
pub fn allow_listing(alias: &str) -> Filter {
    Filter::and([
        Filter::equals(ATTR_OBJECT_CLASS, CLASS_USER),
        Filter::equals(ATTR_ALIAS_ADDRESS, alias),
    ])
}

/// Dynamic membership expression stored on an alias entry
pub fn member_url(base: &str, alias: &str) -> String {
    format!("ldap:///{}??sub?{}", base, allow_listing(alias))
}

pub fn status_value(enabled: bool) -> &'static str {
    if enabled {
        STATUS_ACTIVE
    } else {
        STATUS_DISABLED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_url() {
        assert_eq!(
            member_url("dc=example,dc=org", "sales@example.org"),
            "ldap:///dc=example,dc=org??sub?(&(objectClass=mailUser)(aliasAddress=sales@example.org))"
        );
    }

    #[test]
    fn test_classification_attrs_exclude_password() {
        assert!(!CLASSIFICATION_ATTRS.contains(&ATTR_PASSWORD));
    }
}
