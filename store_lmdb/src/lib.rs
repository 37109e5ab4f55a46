//! LMDB storage backend for the StakePGP ledger.
//!
//! Implements the `stakepgp-store` traits using the `heed` LMDB bindings.
//! All tables live in a single environment so a [`WriteBatch`] touching
//! several of them commits in one write transaction.
//!
//! [`WriteBatch`]: stakepgp_store::WriteBatch

pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;
pub mod stake;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use stake::LmdbStakeStore;
