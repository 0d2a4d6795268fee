//! Credential hashing
//!
//! Plaintext secrets are turned into crypt(3) strings before they reach the
//! directory. The stored value carries a `{CRYPT}` scheme tag so the
//! directory knows how to verify it.

use serde::{Deserialize, Serialize};

/// Scheme tag prefixed to every stored credential
pub const CRYPT_SCHEME: &str = "{CRYPT}";

/// One-way credential hasher
///
/// An empty string from [`CredentialHasher::hash`] means hashing failed.
pub trait CredentialHasher {
    /// Scheme tag stored in front of the hash, e.g. `{CRYPT}`
    fn scheme(&self) -> &str;

    fn hash(&self, plaintext: &str) -> String;
}

/// Which crypt(3) algorithm new hashes use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CryptScheme {
    #[default]
    Bcrypt,
    Sha512Crypt,
}

impl std::fmt::Display for CryptScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptScheme::Bcrypt => write!(f, "bcrypt"),
            CryptScheme::Sha512Crypt => write!(f, "sha512-crypt"),
        }
    }
}

/// crypt(3) hasher with a fresh random salt per call
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptHasher {
    scheme: CryptScheme,
}

impl CryptHasher {
    pub fn new(scheme: CryptScheme) -> Self {
        Self { scheme }
    }
}

impl CredentialHasher for CryptHasher {
    fn scheme(&self) -> &str {
        CRYPT_SCHEME
    }

    fn hash(&self, plaintext: &str) -> String {
        let hashed = match self.scheme {
            CryptScheme::Bcrypt => pwhash::bcrypt::hash(plaintext),
            CryptScheme::Sha512Crypt => pwhash::sha512_crypt::hash(plaintext),
        };

        match hashed {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(scheme = %self.scheme, error = %e, "Credential hashing failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcrypt_hash() {
        let hasher = CryptHasher::default();
        let hash = hasher.hash("secret1");

        assert!(hash.starts_with("$2"));
        assert!(pwhash::bcrypt::verify("secret1", &hash));
        assert!(!pwhash::bcrypt::verify("secret2", &hash));
        assert_eq!(hasher.scheme(), "{CRYPT}");
    }

    #[test]
    fn test_sha512_crypt_hash() {
        let hasher = CryptHasher::new(CryptScheme::Sha512Crypt);
        let hash = hasher.hash("secret1");

        assert!(hash.starts_with("$6$"));
        assert!(pwhash::sha512_crypt::verify("secret1", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = CryptHasher::default();
        assert_ne!(hasher.hash("secret1"), hasher.hash("secret1"));
    }

    #[test]
    fn test_scheme_serde() {
        let scheme: CryptScheme = serde_yaml::from_str("sha512-crypt").unwrap();
        assert_eq!(scheme, CryptScheme::Sha512Crypt);
        assert_eq!(CryptScheme::Bcrypt.to_string(), "bcrypt");
    }
}
