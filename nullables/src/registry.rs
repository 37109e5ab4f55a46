//! Nullable identity registry.

use stakepgp_types::FieldElement;
use stakepgp_verification::{IdentityRegistry, VerificationError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// A registry that accepts (or rejects) every root and records
/// registrations without deduplicating them.
pub struct NullRegistry {
    accept_roots: AtomicBool,
    commitments: Mutex<Vec<FieldElement>>,
}

impl NullRegistry {
    pub fn new(accept_roots: bool) -> Self {
        Self {
            accept_roots: AtomicBool::new(accept_roots),
            commitments: Mutex::new(Vec::new()),
        }
    }

    pub fn set_accept_roots(&self, accept: bool) {
        self.accept_roots.store(accept, Ordering::SeqCst);
    }

    /// Identity and DSC commitments registered so far, in order.
    pub fn commitments(&self) -> Vec<FieldElement> {
        self.commitments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn accepts(&self) -> bool {
        self.accept_roots.load(Ordering::SeqCst)
    }

    fn record(&self, commitment: FieldElement) {
        self.commitments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(commitment);
    }
}

impl Default for NullRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IdentityRegistry for NullRegistry {
    fn check_identity_commitment_root(&self, _root: &FieldElement) -> bool {
        self.accepts()
    }

    fn check_dsc_key_commitment_merkle_root(&self, _root: &FieldElement) -> bool {
        self.accepts()
    }

    fn check_csca_root(&self, _root: &FieldElement) -> bool {
        self.accepts()
    }

    fn check_ofac_root(&self, _root: &FieldElement) -> bool {
        self.accepts()
    }

    fn register_commitment(
        &self,
        _attestation_id: FieldElement,
        _nullifier: FieldElement,
        commitment: FieldElement,
    ) -> Result<(), VerificationError> {
        self.record(commitment);
        Ok(())
    }

    fn register_dsc_key_commitment(&self, commitment: FieldElement) -> Result<(), VerificationError> {
        self.record(commitment);
        Ok(())
    }
}
