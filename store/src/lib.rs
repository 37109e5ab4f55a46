//! Abstract storage traits for the StakePGP ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Reads go through [`StakeStore`] directly; every mutation is staged in a
//! [`WriteBatch`] and applied with [`StakeStore::commit`], which backends
//! must make atomic: either every operation in the batch lands or none does.

pub mod batch;
pub mod error;
pub mod meta;
pub mod stake;

pub use batch::{WriteBatch, WriteOp};
pub use error::StoreError;
pub use meta::MetaStore;
pub use stake::StakeStore;
