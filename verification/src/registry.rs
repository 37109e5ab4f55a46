//! The identity registry: known Merkle roots and registered commitments.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use stakepgp_types::FieldElement;

use crate::VerificationError;

/// Root checks and commitment registration backing the hub.
pub trait IdentityRegistry: Send + Sync {
    fn check_identity_commitment_root(&self, root: &FieldElement) -> bool;

    fn check_dsc_key_commitment_merkle_root(&self, root: &FieldElement) -> bool;

    fn check_csca_root(&self, root: &FieldElement) -> bool;

    fn check_ofac_root(&self, root: &FieldElement) -> bool;

    /// Record a passport identity commitment. A nullifier registers at most once.
    fn register_commitment(
        &self,
        attestation_id: FieldElement,
        nullifier: FieldElement,
        commitment: FieldElement,
    ) -> Result<(), VerificationError>;

    fn register_dsc_key_commitment(&self, commitment: FieldElement) -> Result<(), VerificationError>;
}

/// Roots a [`MemoryRegistry`] accepts, usually loaded from node config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRoots {
    #[serde(default)]
    pub identity_commitment_roots: Vec<FieldElement>,
    #[serde(default)]
    pub dsc_key_commitment_roots: Vec<FieldElement>,
    #[serde(default)]
    pub csca_root: Option<FieldElement>,
    #[serde(default)]
    pub ofac_root: Option<FieldElement>,
}

#[derive(Default)]
struct RegistryState {
    identity_roots: BTreeSet<FieldElement>,
    dsc_roots: BTreeSet<FieldElement>,
    csca_root: Option<FieldElement>,
    ofac_root: Option<FieldElement>,
    commitments: HashMap<FieldElement, (FieldElement, FieldElement)>,
    dsc_commitments: BTreeSet<FieldElement>,
}

/// Registry kept in memory.
///
/// Tree maintenance happens elsewhere; this registry accepts the roots it
/// was given and records the commitments submitted through the hub.
#[derive(Default)]
pub struct MemoryRegistry {
    state: Mutex<RegistryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: &RegistryRoots) -> Self {
        let registry = Self::new();
        {
            let mut state = registry.lock();
            state.identity_roots = roots.identity_commitment_roots.iter().copied().collect();
            state.dsc_roots = roots.dsc_key_commitment_roots.iter().copied().collect();
            state.csca_root = roots.csca_root;
            state.ofac_root = roots.ofac_root;
        }
        registry
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_identity_commitment_root(&self, root: FieldElement) {
        self.lock().identity_roots.insert(root);
    }

    pub fn add_dsc_key_commitment_root(&self, root: FieldElement) {
        self.lock().dsc_roots.insert(root);
    }

    pub fn set_csca_root(&self, root: FieldElement) {
        self.lock().csca_root = Some(root);
    }

    pub fn set_ofac_root(&self, root: FieldElement) {
        self.lock().ofac_root = Some(root);
    }

    pub fn commitment_count(&self) -> usize {
        self.lock().commitments.len()
    }

    pub fn is_dsc_key_commitment_registered(&self, commitment: &FieldElement) -> bool {
        self.lock().dsc_commitments.contains(commitment)
    }
}

impl IdentityRegistry for MemoryRegistry {
    fn check_identity_commitment_root(&self, root: &FieldElement) -> bool {
        self.lock().identity_roots.contains(root)
    }

    fn check_dsc_key_commitment_merkle_root(&self, root: &FieldElement) -> bool {
        self.lock().dsc_roots.contains(root)
    }

    fn check_csca_root(&self, root: &FieldElement) -> bool {
        self.lock().csca_root.as_ref() == Some(root)
    }

    fn check_ofac_root(&self, root: &FieldElement) -> bool {
        self.lock().ofac_root.as_ref() == Some(root)
    }

    fn register_commitment(
        &self,
        attestation_id: FieldElement,
        nullifier: FieldElement,
        commitment: FieldElement,
    ) -> Result<(), VerificationError> {
        let mut state = self.lock();
        if state.commitments.contains_key(&nullifier) {
            return Err(VerificationError::RegisteredCommitment);
        }
        state.commitments.insert(nullifier, (attestation_id, commitment));
        Ok(())
    }

    fn register_dsc_key_commitment(&self, commitment: FieldElement) -> Result<(), VerificationError> {
        if !self.lock().dsc_commitments.insert(commitment) {
            return Err(VerificationError::RegisteredCommitment);
        }
        Ok(())
    }
}
