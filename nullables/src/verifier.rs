//! Nullable circuit verifier.

use stakepgp_types::FieldElement;
use stakepgp_verification::CircuitVerifier;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A verifier whose answer is set by the test.
pub struct NullVerifier {
    name: String,
    accept: AtomicBool,
    calls: AtomicUsize,
}

impl NullVerifier {
    pub fn new(name: impl Into<String>, accept: bool) -> Self {
        Self {
            name: name.into(),
            accept: AtomicBool::new(accept),
            calls: AtomicUsize::new(0),
        }
    }

    /// Accepts every proof.
    pub fn accepting() -> Self {
        Self::new("null-accepting", true)
    }

    /// Rejects every proof.
    pub fn rejecting() -> Self {
        Self::new("null-rejecting", false)
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// How many proofs reached this verifier.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CircuitVerifier for NullVerifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn verify_proof(
        &self,
        _a: &[FieldElement; 2],
        _b: &[[FieldElement; 2]; 2],
        _c: &[FieldElement; 2],
        _pub_signals: &[FieldElement],
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept.load(Ordering::SeqCst)
    }
}
