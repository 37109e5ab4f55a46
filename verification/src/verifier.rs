//! Pluggable circuit verifiers.

use stakepgp_types::FieldElement;

/// A Groth16 verifier for one circuit.
///
/// The hub decides which verifier a proof goes to and which public signals it
/// must carry; the verifier only answers whether the pairing check holds.
pub trait CircuitVerifier: Send + Sync {
    /// Human-readable name, reported in verifier-update events.
    fn name(&self) -> &str;

    fn verify_proof(
        &self,
        a: &[FieldElement; 2],
        b: &[[FieldElement; 2]; 2],
        c: &[FieldElement; 2],
        pub_signals: &[FieldElement],
    ) -> bool;
}
