//! StakePGP node: wires storage, the verification hub, the stake ledger
//! and the RPC server together.
//!
//! The node:
//! - Loads its [`NodeConfig`] from TOML
//! - Opens the LMDB ledger store under the data directory
//! - Builds the identity registry from the configured roots
//! - Installs the Groth16 verifying keys named under `[verifiers]`
//! - Serves the HTTP API until SIGINT/SIGTERM or a programmatic shutdown

pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;

pub use config::{NodeConfig, TypedVerifierKey, VerifierConfig};
pub use error::NodeError;
pub use node::StakeNode;
pub use shutdown::ShutdownController;
