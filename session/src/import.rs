//! Bringing a PGP key into the session.

use std::sync::Arc;

use stakepgp_keyserver::KeyserverClient;

use crate::identity::{parse_user_id, PgpIdentity, PrivateKey};
use crate::inspect::KeyInspector;
use crate::SessionError;

/// Where an imported key comes from.
#[derive(Clone, Debug)]
pub enum ImportSource {
    /// Look the key up on the keyserver.
    Fingerprint(String),
    /// A key pasted in armored form, with its private half if available.
    Armored {
        public_key: String,
        private_key: Option<String>,
    },
}

/// Resolves an [`ImportSource`] into a [`PgpIdentity`].
#[derive(Clone)]
pub struct KeyImporter {
    keyserver: KeyserverClient,
    inspector: Arc<dyn KeyInspector>,
}

impl KeyImporter {
    pub fn new(keyserver: KeyserverClient, inspector: Arc<dyn KeyInspector>) -> Self {
        Self {
            keyserver,
            inspector,
        }
    }

    pub fn keyserver(&self) -> &KeyserverClient {
        &self.keyserver
    }

    pub async fn resolve(&self, source: ImportSource) -> Result<PgpIdentity, SessionError> {
        match source {
            ImportSource::Fingerprint(fingerprint) => self.lookup(&fingerprint).await,
            ImportSource::Armored {
                public_key,
                private_key,
            } => {
                let metadata = self.inspector.inspect(&public_key)?;
                let user = parse_user_id(&metadata.user_id);
                Ok(PgpIdentity {
                    key_id: metadata.fingerprint.to_ascii_uppercase(),
                    name: user.name,
                    email: user.email,
                    public_key,
                    private_key: private_key.map(PrivateKey::Armored),
                })
            }
        }
    }

    /// Fetch the armored key and take its fingerprint and primary user id
    /// from the keyserver's index.
    async fn lookup(&self, fingerprint: &str) -> Result<PgpIdentity, SessionError> {
        let public_key = self.keyserver.fetch_key(fingerprint).await?;
        let entries = self.keyserver.search_index(fingerprint).await?;
        let entry = entries
            .into_iter()
            .find(|e| !e.is_revoked())
            .ok_or_else(|| SessionError::InvalidKey(format!("no usable index entry for {fingerprint}")))?;
        let user_id = entry
            .primary_user_id()
            .ok_or_else(|| SessionError::InvalidUserId(entry.key_id.clone()))?;
        let user = parse_user_id(user_id);
        tracing::debug!(key_id = %entry.key_id, "resolved key from keyserver");
        Ok(PgpIdentity {
            key_id: entry.key_id.clone(),
            name: user.name,
            email: user.email,
            public_key,
            private_key: None,
        })
    }
}
