//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use stakepgp_ledger::{LedgerError, StakeLedger};
use stakepgp_utils::StatsCounter;

use crate::error::RpcError;
use crate::handlers;

/// The ledger as shared by request handlers. Holding the lock serializes
/// every read and write.
pub type SharedLedger = Arc<Mutex<StakeLedger>>;

/// Counter names, one per write operation plus rejections.
pub const STAT_NAMES: &[&str] = &[
    "stake",
    "challenge",
    "claim",
    "withdraw",
    "extend_lock",
    "prove_identity",
    "register",
    "ownership",
    "admin",
    "rejected",
];

#[derive(Clone)]
pub struct RpcState {
    pub ledger: SharedLedger,
    pub stats: Arc<StatsCounter>,
}

impl RpcState {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            stats: Arc::new(StatsCounter::new(STAT_NAMES)),
        }
    }

    /// Count the outcome of a write and log rejections.
    pub(crate) fn finish<T>(
        &self,
        op: &'static str,
        result: Result<T, LedgerError>,
    ) -> Result<T, RpcError> {
        match result {
            Ok(value) => {
                self.stats.increment(op);
                Ok(value)
            }
            Err(e) => Err(self.reject(op, e)),
        }
    }

    /// Count and log a rejected request.
    pub(crate) fn reject(&self, op: &'static str, e: LedgerError) -> RpcError {
        self.stats.increment("rejected");
        warn!(op, error = e.name(), "rejected: {e}");
        e.into()
    }
}

/// Build the API router over `state`.
pub fn router(state: RpcState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/constants", get(handlers::constants))
        .route("/stats", get(handlers::stats))
        .route("/stakes/:address", get(handlers::stake_of))
        .route("/stakes/:address/lock", get(handlers::remaining_lock))
        .route("/keys/:key_id", get(handlers::key_status))
        .route("/balances/:address", get(handlers::balance_of))
        .route("/owner", get(handlers::owner))
        .route("/forbidden-countries/:packed", get(handlers::forbidden_countries))
        .route("/revealed-data", post(handlers::revealed_data))
        .route("/stake", post(handlers::stake))
        .route("/challenge", post(handlers::challenge))
        .route("/claim", post(handlers::claim))
        .route("/withdraw", post(handlers::withdraw))
        .route("/extend-lock", post(handlers::extend_lock))
        .route("/prove-identity", post(handlers::prove_identity))
        .route("/register/passport", post(handlers::register_passport))
        .route("/register/dsc", post(handlers::register_dsc))
        .route("/ownership/transfer", post(handlers::transfer_ownership))
        .route("/ownership/accept", post(handlers::accept_ownership))
        .route("/ownership/renounce", post(handlers::renounce_ownership))
        .route(
            "/admin/verifiers/vc-and-disclose",
            post(handlers::install_vc_and_disclose_verifier),
        )
        .route("/admin/verifiers/register", post(handlers::install_register_verifier))
        .route("/admin/verifiers/dsc", post(handlers::install_dsc_verifier))
        .route("/admin/registry", post(handlers::update_registry))
        .layer(cors)
        .with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    state: RpcState,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, ledger: SharedLedger) -> Self {
        Self {
            addr,
            state: RpcState::new(ledger),
        }
    }

    pub fn state(&self) -> &RpcState {
        &self.state
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        info!("RPC server listening on {}", self.addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("RPC server stopped");
        Ok(())
    }
}
