//! Nullable infrastructure for deterministic testing.
//!
//! Everything the ledger talks to (clock, storage, circuit verifiers, the
//! identity registry, OpenPGP key inspection) sits behind a trait. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod groth16;
pub mod inspector;
pub mod proof;
pub mod registry;
pub mod store;
pub mod verifier;

pub use clock::NullClock;
pub use groth16::{Groth16Fixture, ProofPoints};
pub use inspector::NullKeyInspector;
pub use proof::ProofBuilder;
pub use registry::NullRegistry;
pub use store::NullStore;
pub use verifier::NullVerifier;
