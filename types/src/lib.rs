//! Fundamental types for the StakePGP ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, wei amounts, timestamps, PGP key ids, proof field elements,
//! staking parameters, the stake record and registered passport commitments.

pub mod address;
pub mod amount;
pub mod commitment;
pub mod error;
pub mod field;
pub mod key_id;
pub mod params;
pub mod stake;
pub mod time;

pub use address::Address;
pub use amount::Wei;
pub use commitment::PassportCommitment;
pub use error::TypesError;
pub use field::FieldElement;
pub use key_id::KeyId;
pub use params::{FeeDisposition, IdentityPolicy, StakeParams};
pub use stake::{StakeRecord, StakeView};
pub use time::{Clock, SystemClock, Timestamp};
