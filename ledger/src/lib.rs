//! The stake ledger.
//!
//! A user stakes ETH against a PGP key. Anyone else may challenge the stake
//! by paying a fee; the staker then has a fixed window to answer with a
//! passport proof, or the challenger claims the stake. Unchallenged stakes
//! unlock after the minimum stake duration.
//!
//! Every operation validates first and then commits a single
//! [`WriteBatch`](stakepgp_store::WriteBatch), so a failed call leaves no
//! trace in the store.

pub mod error;
pub mod event;
pub mod ledger;
pub mod ownership;

pub use error::LedgerError;
pub use event::{EventBus, LedgerEvent};
pub use ledger::{KeyStatus, StakeLedger};
pub use ownership::Ownership;
pub use stakepgp_store::StoreError;
