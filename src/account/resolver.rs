//! Address status resolution

use super::cache::LookupCache;
use super::schema::{
    self, ATTR_OBJECT_CLASS, CLASSIFICATION_ATTRS, CLASS_ALIAS, CLASS_EXTERNAL, CLASS_LIST,
    CLASS_USER,
};
use super::status::{Resolution, Snapshot, Status};
use crate::address::tokenize;
use crate::Result;
use mail_directory::{Directory, Entry, Scope};

/// Look an address up under `base` and classify it
///
/// A unique match refreshes the cache entry for the address. Zero or
/// several matches leave the cache untouched.
pub fn resolve<D: Directory + ?Sized>(
    directory: &mut D,
    base: &str,
    cache: &mut LookupCache,
    address: &str,
) -> Result<Resolution> {
    tokenize(address)?;

    let mut entries = directory.search(
        base,
        Scope::Subtree,
        &schema::by_address(address),
        CLASSIFICATION_ATTRS,
    )?;

    let entry = match entries.len() {
        0 => return Ok(Resolution::absent()),
        1 => entries.remove(0),
        _ => return Ok(Resolution::unknown()),
    };

    let status = classify(&entry);
    let snapshot = Snapshot::new(address, entry);
    cache.store(snapshot.clone());

    Ok(Resolution {
        status,
        snapshot: Some(snapshot),
    })
}

/// Classify an entry by its type tags, user first
pub fn classify(entry: &Entry) -> Status {
    let tagged = |class: &str| entry.has_value(ATTR_OBJECT_CLASS, class);

    if tagged(CLASS_USER) {
        Status::User
    } else if tagged(CLASS_ALIAS) {
        Status::Alias
    } else if tagged(CLASS_LIST) {
        Status::List
    } else if tagged(CLASS_EXTERNAL) {
        Status::External
    } else {
        Status::Unknown
    }
}
