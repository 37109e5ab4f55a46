//! Nullable OpenPGP key inspector.

use stakepgp_session::{KeyInspector, KeyMetadata, SessionError};
use std::collections::HashMap;

/// Returns canned metadata for known armored keys.
#[derive(Default)]
pub struct NullKeyInspector {
    keys: HashMap<String, KeyMetadata>,
}

impl NullKeyInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, armored: impl Into<String>, metadata: KeyMetadata) -> Self {
        self.keys.insert(armored.into().trim().to_string(), metadata);
        self
    }
}

impl KeyInspector for NullKeyInspector {
    fn inspect(&self, armored: &str) -> Result<KeyMetadata, SessionError> {
        self.keys
            .get(armored.trim())
            .cloned()
            .ok_or_else(|| SessionError::InvalidKey("unrecognized key material".into()))
    }
}
