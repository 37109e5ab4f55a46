//! HTTP JSON API for the StakePGP node.
//!
//! Provides endpoints for:
//! - Ledger constants, stake records, lock times and balances
//! - Key registry lookups
//! - Stake, challenge, claim, withdraw and lock extension
//! - Identity proofs and revealed passport data
//! - Passport and DSC key commitment registration
//! - Ownership of the admin functions
//! - Owner-only installation of circuit verifiers and registry roots

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState, SharedLedger};
