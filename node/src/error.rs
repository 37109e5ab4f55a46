use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] stakepgp_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] stakepgp_store_lmdb::LmdbError),

    #[error("verifier error: {0}")]
    Verifier(#[from] stakepgp_verification::VerificationError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] stakepgp_rpc::RpcError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
