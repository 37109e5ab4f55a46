//! The StakePGP node: wires storage, verification, the ledger and RPC together.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use stakepgp_ledger::{LedgerEvent, StakeLedger};
use stakepgp_rpc::{RpcServer, SharedLedger};
use stakepgp_store_lmdb::LmdbEnvironment;
use stakepgp_types::SystemClock;
use stakepgp_verification::{CircuitVerifier, Groth16Verifier, MemoryRegistry, VerificationHub};

use crate::config::{NodeConfig, VerifierConfig};
use crate::error::NodeError;
use crate::shutdown::ShutdownController;

pub struct StakeNode {
    config: NodeConfig,
    ledger: SharedLedger,
    registry: Arc<MemoryRegistry>,
    shutdown: ShutdownController,
    // Keeps the environment open for the stores handed to the ledger.
    _env: LmdbEnvironment,
}

impl StakeNode {
    /// Open storage and build the ledger. Circuits without a configured
    /// verifying key fail with `NO_VERIFIER_SET` until the owner installs one.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let owner = config.require_owner()?;
        std::fs::create_dir_all(&config.data_dir)?;
        let env = LmdbEnvironment::open(&config.ledger_dir(), config.map_size)?;

        let registry = Arc::new(MemoryRegistry::from_roots(&config.registry));
        let mut hub = VerificationHub::new(registry.clone());
        install_verifiers(&mut hub, &config.verifiers)?;
        let mut ledger = StakeLedger::new(
            Arc::new(env.stake_store()),
            Arc::new(SystemClock),
            hub,
            owner,
            config.stake.clone(),
            config.identity.clone(),
        )?;
        ledger.subscribe(Box::new(|event: &LedgerEvent| {
            if let Ok(json) = serde_json::to_string(event) {
                debug!(target: "stakepgp_node::events", "{json}");
            }
        }));

        info!(
            data_dir = %config.data_dir.display(),
            %owner,
            minimum_stake = %config.stake.minimum_stake,
            "node initialized"
        );

        Ok(Self {
            config,
            ledger: Arc::new(Mutex::new(ledger)),
            registry,
            shutdown: ShutdownController::new(),
            _env: env,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    pub fn registry(&self) -> &Arc<MemoryRegistry> {
        &self.registry
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Serve until SIGINT/SIGTERM or [`ShutdownController::shutdown`].
    pub async fn run(&self) -> Result<(), NodeError> {
        let stopped = self.shutdown.signalled();
        let watcher = async {
            tokio::select! {
                _ = self.shutdown.wait_for_signal() => {}
                _ = stopped => {}
            }
        };

        if !self.config.enable_rpc {
            info!("RPC disabled; waiting for shutdown");
            watcher.await;
            return Ok(());
        }

        let server = RpcServer::new(self.config.rpc_addr(), self.ledger());
        let serve = server.start(self.shutdown.signalled());
        tokio::pin!(serve);

        tokio::select! {
            // The server only returns early on error (e.g. the port is taken).
            result = &mut serve => return result.map_err(NodeError::from),
            _ = watcher => {}
        }
        serve.await?;
        info!("node stopped");
        Ok(())
    }
}

/// Load every configured verifying key into `hub`.
fn install_verifiers(hub: &mut VerificationHub, config: &VerifierConfig) -> Result<(), NodeError> {
    if let Some(path) = &config.vc_and_disclose {
        let verifier = Groth16Verifier::from_file(path)?;
        info!(verifier = verifier.name(), "vc-and-disclose verifier installed");
        hub.set_vc_and_disclose_verifier(Arc::new(verifier));
    }
    for key in &config.register {
        let verifier = Groth16Verifier::from_file(&key.verifying_key)?;
        info!(type_id = key.type_id, verifier = verifier.name(), "register verifier installed");
        hub.set_register_verifier(key.type_id, Arc::new(verifier));
    }
    for key in &config.dsc {
        let verifier = Groth16Verifier::from_file(&key.verifying_key)?;
        info!(type_id = key.type_id, verifier = verifier.name(), "DSC verifier installed");
        hub.set_dsc_verifier(key.type_id, Arc::new(verifier));
    }
    Ok(())
}
