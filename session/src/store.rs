//! Where the identity lives between sessions.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{PgpIdentity, SessionError};

/// The fixed identifier the identity is stored under.
pub const IDENTITY_ID: &str = "pgp_identity";

pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Result<Option<PgpIdentity>, SessionError>;
    fn save(&self, identity: &PgpIdentity) -> Result<(), SessionError>;
    /// Delete the stored identity. Removing a missing identity is not an error.
    fn remove(&self) -> Result<(), SessionError>;
}

/// JSON file `pgp_identity.json` inside a directory.
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{IDENTITY_ID}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<PgpIdentity>, SessionError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, identity: &PgpIdentity) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(identity)?;
        // Readers never observe a partially written file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identity: Mutex<Option<PgpIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<PgpIdentity>, SessionError> {
        Ok(self
            .identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, identity: &PgpIdentity) -> Result<(), SessionError> {
        *self.identity.lock().unwrap_or_else(PoisonError::into_inner) = Some(identity.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        self.identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PgpIdentity {
        PgpIdentity {
            key_id: "ABCD1234".into(),
            name: "Alice".into(),
            email: "alice@example.org".into(),
            public_key: "PUB".into(),
            private_key: None,
        }
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);

        store.save(&identity()).unwrap();
        assert!(store.path().ends_with("pgp_identity.json"));
        assert_eq!(store.load().unwrap(), Some(identity()));

        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.remove().unwrap();
    }

    #[test]
    fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::new(dir.path().join("nested/wallet"));
        store.save(&identity()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(SessionError::Serialization(_))));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryIdentityStore::new();
        store.save(&identity()).unwrap();
        assert_eq!(store.load().unwrap(), Some(identity()));
        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
