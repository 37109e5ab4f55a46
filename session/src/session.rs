//! Identity lifecycle bound to a wallet connection.

use std::sync::Arc;

use stakepgp_types::Address;
use zeroize::Zeroizing;

use crate::identity::{PgpIdentity, PrivateKey};
use crate::import::{ImportSource, KeyImporter};
use crate::keystore::{open_private_key, seal_private_key, KdfParams};
use crate::store::IdentityStore;
use crate::SessionError;

pub struct Session {
    store: Arc<dyn IdentityStore>,
    wallet: Option<Address>,
    identity: Option<PgpIdentity>,
}

impl Session {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            wallet: None,
            identity: None,
        }
    }

    /// Bind the session to a wallet and load the stored identity, if any.
    pub fn connect(&mut self, wallet: Address) -> Result<Option<&PgpIdentity>, SessionError> {
        self.identity = self.store.load()?;
        self.wallet = Some(wallet);
        tracing::debug!(%wallet, has_identity = self.identity.is_some(), "session connected");
        Ok(self.identity.as_ref())
    }

    /// Forget the wallet and the in-memory identity. The stored copy stays.
    pub fn disconnect(&mut self) {
        self.wallet = None;
        self.identity = None;
    }

    /// Delete the stored identity and disconnect.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.remove()?;
        self.disconnect();
        tracing::info!("identity removed");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn wallet(&self) -> Option<Address> {
        self.wallet
    }

    pub fn identity(&self) -> Option<&PgpIdentity> {
        self.identity.as_ref()
    }

    pub fn require_identity(&self) -> Result<&PgpIdentity, SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.identity.as_ref().ok_or(SessionError::NoIdentity)
    }

    /// Persist `identity` and make it the session's identity.
    pub fn set_identity(&mut self, identity: PgpIdentity) -> Result<&PgpIdentity, SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.store.save(&identity)?;
        tracing::info!(key_id = %identity.key_id, "identity saved");
        Ok(self.identity.insert(identity))
    }

    /// Resolve a key from either source and store it as the identity.
    pub async fn import(
        &mut self,
        importer: &KeyImporter,
        source: ImportSource,
    ) -> Result<&PgpIdentity, SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let identity = importer.resolve(source).await?;
        self.set_identity(identity)
    }

    /// Replace a plaintext private key with a passphrase-sealed one.
    pub fn seal_private_key(
        &mut self,
        passphrase: &str,
        params: KdfParams,
    ) -> Result<(), SessionError> {
        let identity = self.require_identity()?;
        let sealed = match &identity.private_key {
            None => return Err(SessionError::NoPrivateKey),
            Some(PrivateKey::Sealed(_)) => return Err(SessionError::AlreadySealed),
            Some(PrivateKey::Armored(armored)) => seal_private_key(armored, passphrase, params)?,
        };
        let mut updated = identity.clone();
        updated.private_key = Some(PrivateKey::Sealed(sealed));
        self.set_identity(updated)?;
        Ok(())
    }

    /// The armored private key, opening it with `passphrase` when sealed.
    pub fn private_key(&self, passphrase: Option<&str>) -> Result<Zeroizing<String>, SessionError> {
        match &self.require_identity()?.private_key {
            None => Err(SessionError::NoPrivateKey),
            Some(PrivateKey::Armored(armored)) => Ok(Zeroizing::new(armored.clone())),
            Some(PrivateKey::Sealed(sealed)) => match passphrase {
                Some(passphrase) => open_private_key(sealed, passphrase),
                None => Err(SessionError::WrongPassphrase),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIdentityStore;

    fn identity(private_key: Option<&str>) -> PgpIdentity {
        PgpIdentity {
            key_id: "ABCD1234".into(),
            name: "Alice".into(),
            email: "alice@example.org".into(),
            public_key: "PUB".into(),
            private_key: private_key.map(|k| PrivateKey::Armored(k.into())),
        }
    }

    fn light() -> KdfParams {
        KdfParams {
            memory: 256,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn connect_loads_and_disconnect_keeps_store() {
        let store = Arc::new(MemoryIdentityStore::new());
        store.save(&identity(None)).unwrap();
        let mut session = Session::new(store.clone());

        assert!(session.identity().is_none());
        let loaded = session.connect(Address::new([1; 20])).unwrap();
        assert_eq!(loaded.map(|i| i.key_id.as_str()), Some("ABCD1234"));

        session.disconnect();
        assert!(!session.is_connected());
        assert!(session.identity().is_none());
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn logout_deletes_stored_identity() {
        let store = Arc::new(MemoryIdentityStore::new());
        let mut session = Session::new(store.clone());
        session.connect(Address::new([1; 20])).unwrap();
        session.set_identity(identity(None)).unwrap();

        session.logout().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(session.identity().is_none());
    }

    #[test]
    fn writes_require_a_connected_wallet() {
        let mut session = Session::new(Arc::new(MemoryIdentityStore::new()));
        assert!(matches!(
            session.set_identity(identity(None)),
            Err(SessionError::NotConnected)
        ));
        assert!(matches!(session.require_identity(), Err(SessionError::NotConnected)));

        session.connect(Address::new([1; 20])).unwrap();
        assert!(matches!(session.require_identity(), Err(SessionError::NoIdentity)));
    }

    #[test]
    fn sealing_replaces_plaintext_key() {
        let store = Arc::new(MemoryIdentityStore::new());
        let mut session = Session::new(store.clone());
        session.connect(Address::new([1; 20])).unwrap();
        session.set_identity(identity(Some("PRIVATE"))).unwrap();

        session.seal_private_key("hunter2", light()).unwrap();
        let stored = store.load().unwrap().unwrap();
        assert!(stored.private_key.as_ref().is_some_and(PrivateKey::is_sealed));

        assert_eq!(session.private_key(Some("hunter2")).unwrap().as_str(), "PRIVATE");
        assert!(matches!(
            session.private_key(Some("wrong")),
            Err(SessionError::WrongPassphrase)
        ));
        assert!(matches!(
            session.seal_private_key("again", light()),
            Err(SessionError::AlreadySealed)
        ));
    }

    #[test]
    fn sealing_without_private_key_fails() {
        let mut session = Session::new(Arc::new(MemoryIdentityStore::new()));
        session.connect(Address::new([1; 20])).unwrap();
        session.set_identity(identity(None)).unwrap();
        assert!(matches!(
            session.seal_private_key("pass", light()),
            Err(SessionError::NoPrivateKey)
        ));
    }
}
