//! Reading identity metadata out of armored OpenPGP keys.

use crate::SessionError;

const PUBLIC_KEY_HEADER: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";
const PUBLIC_KEY_FOOTER: &str = "-----END PGP PUBLIC KEY BLOCK-----";

/// What an identity needs to know about a public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMetadata {
    /// Hex fingerprint of the primary key.
    pub fingerprint: String,
    /// The primary user id, `"Name <email>"`.
    pub user_id: String,
}

/// Extracts [`KeyMetadata`] from an armored public key.
pub trait KeyInspector: Send + Sync {
    fn inspect(&self, armored: &str) -> Result<KeyMetadata, SessionError>;
}

/// Check the ASCII-armor framing of a public key block.
pub fn check_armor(armored: &str) -> Result<(), SessionError> {
    let trimmed = armored.trim();
    if !trimmed.starts_with(PUBLIC_KEY_HEADER) {
        return Err(SessionError::InvalidKey("missing public key armor header".into()));
    }
    if !trimmed.ends_with(PUBLIC_KEY_FOOTER) {
        return Err(SessionError::InvalidKey("missing public key armor footer".into()));
    }
    Ok(())
}

/// Inspector for keys whose fingerprint and user id the caller states up
/// front, as with a key pasted on the command line alongside
/// `--fingerprint`/`--user-id`. Only the armor framing is checked.
pub struct DeclaredKeyInspector {
    metadata: KeyMetadata,
}

impl DeclaredKeyInspector {
    pub fn new(fingerprint: &str, user_id: impl Into<String>) -> Result<Self, SessionError> {
        let fingerprint: String = fingerprint
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .trim_start_matches("0x")
            .to_ascii_uppercase();
        if fingerprint.is_empty() || !fingerprint.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SessionError::InvalidKey(format!(
                "fingerprint is not hex: {fingerprint}"
            )));
        }
        Ok(Self {
            metadata: KeyMetadata {
                fingerprint,
                user_id: user_id.into(),
            },
        })
    }
}

impl KeyInspector for DeclaredKeyInspector {
    fn inspect(&self, armored: &str) -> Result<KeyMetadata, SessionError> {
        check_armor(armored)?;
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARMORED: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nmQINBGZ\n-----END PGP PUBLIC KEY BLOCK-----\n";

    #[test]
    fn armor_framing_is_checked() {
        assert!(check_armor(ARMORED).is_ok());
        assert!(matches!(check_armor("mQINBGZ"), Err(SessionError::InvalidKey(_))));
        assert!(matches!(
            check_armor("-----BEGIN PGP PUBLIC KEY BLOCK-----\nmQINBGZ"),
            Err(SessionError::InvalidKey(_))
        ));
    }

    #[test]
    fn declared_metadata_is_normalized() {
        let inspector = DeclaredKeyInspector::new("0xabcd 1234", "Alice <a@example.org>").unwrap();
        let metadata = inspector.inspect(ARMORED).unwrap();
        assert_eq!(metadata.fingerprint, "ABCD1234");
        assert_eq!(metadata.user_id, "Alice <a@example.org>");
    }

    #[test]
    fn declared_fingerprint_must_be_hex() {
        assert!(DeclaredKeyInspector::new("not-hex", "x").is_err());
        assert!(DeclaredKeyInspector::new("", "x").is_err());
    }
}
