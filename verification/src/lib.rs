//! Identity verification for challenged stakes.
//!
//! A staker answers a challenge with a zero-knowledge passport proof
//! ("VC-and-disclose"). The [`VerificationHub`] checks that proof against
//! the identity registry and the ledger's disclosure policy, then hands it
//! to the circuit verifier. Circuit verifiers and the registry are
//! pluggable: the hub decides *which* checks run, not *how* a Groth16
//! proof or a Merkle root is validated. [`Groth16Verifier`] is the
//! in-process backend, built from a snarkjs verifying key.

pub mod date;
pub mod error;
pub mod groth16;
pub mod hub;
pub mod proof;
pub mod registry;
pub mod revealed;
pub mod verifier;

pub use error::VerificationError;
pub use groth16::Groth16Verifier;
pub use hub::{VcAndDiscloseOptions, VcAndDiscloseResult, VerificationHub};
pub use proof::{DscProof, RegisterProof, VcAndDiscloseProof};
pub use registry::{IdentityRegistry, MemoryRegistry, RegistryRoots};
pub use revealed::{
    pack_forbidden_countries, readable_forbidden_countries, readable_revealed_data,
    ReadableRevealedData, RevealedDataType, MAX_FORBIDDEN_COUNTRIES,
};
pub use verifier::CircuitVerifier;
