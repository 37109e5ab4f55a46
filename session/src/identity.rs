//! The persisted PGP identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::keystore::SealedKey;

/// Name and email split out of an OpenPGP user id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserId {
    pub name: String,
    pub email: String,
}

/// Split `"Name <email>"` into its parts.
///
/// Text before the first `<` is the name; the first non-empty `<...>` is the
/// email. A user id without an email is all name.
pub fn parse_user_id(user_id: &str) -> UserId {
    let user_id = user_id.trim();
    if let Some(open) = user_id.find('<') {
        let rest = &user_id[open + 1..];
        if let Some(close) = rest.get(1..).and_then(|r| r.find('>')) {
            return UserId {
                name: user_id[..open].trim_end().to_string(),
                email: rest[..close + 1].to_string(),
            };
        }
    }
    UserId {
        name: user_id.to_string(),
        email: String::new(),
    }
}

/// Private key material kept with an identity: the armored block as
/// imported, or sealed under a passphrase.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrivateKey {
    Armored(String),
    Sealed(SealedKey),
}

impl PrivateKey {
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed(_))
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        if let Self::Armored(key) = self {
            key.zeroize();
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Armored(_) => f.write_str("PrivateKey::Armored(<redacted>)"),
            Self::Sealed(_) => f.write_str("PrivateKey::Sealed(..)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgpIdentity {
    /// Upper-case hex fingerprint.
    pub key_id: String,
    pub name: String,
    pub email: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PrivateKey>,
}

impl PgpIdentity {
    /// `"name <email>"`, or just the name when there is no email.
    pub fn user_info(&self) -> String {
        if self.email.is_empty() {
            self.name.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }
}
