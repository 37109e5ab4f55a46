//! Normalized PGP key identifiers used by the key registry index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// The index key a staked PGP key is registered under.
///
/// Fingerprints and long/short key ids are normalized to upper-case hex with
/// whitespace and any `0x` prefix removed, so `"abcd 1234"`, `"0xABCD1234"`
/// and `"ABCD1234"` all name the same key. Anything that is not hex (an
/// armored public key block pasted in full) is indexed by its text with
/// line breaks and runs of whitespace collapsed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Normalize raw key material into an index key.
    pub fn normalize(raw: &str) -> Result<Self, TypesError> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = compact
            .strip_prefix("0x")
            .or_else(|| compact.strip_prefix("0X"))
            .unwrap_or(&compact);
        if digits.is_empty() {
            return Err(TypesError::EmptyKeyId);
        }
        if digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(Self(digits.to_ascii_uppercase()));
        }
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(Self(collapsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key id is a hex fingerprint or key id (as opposed to
    /// full key material).
    pub fn is_fingerprint(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms_normalize_to_same_key() {
        let a = KeyId::normalize("abcd 1234").unwrap();
        let b = KeyId::normalize("0xABCD1234").unwrap();
        let c = KeyId::normalize(" ABCD1234\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "ABCD1234");
        assert!(a.is_fingerprint());
    }

    #[test]
    fn armored_material_collapses_whitespace() {
        let armored = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nmQINBGZ\n-----END PGP PUBLIC KEY BLOCK-----\n";
        let id = KeyId::normalize(armored).unwrap();
        assert_eq!(
            id.as_str(),
            "-----BEGIN PGP PUBLIC KEY BLOCK----- mQINBGZ -----END PGP PUBLIC KEY BLOCK-----"
        );
        assert!(!id.is_fingerprint());
    }

    #[test]
    fn empty_input_rejected() {
        assert_eq!(KeyId::normalize("  \n"), Err(TypesError::EmptyKeyId));
        assert_eq!(KeyId::normalize("0x"), Err(TypesError::EmptyKeyId));
    }
}
