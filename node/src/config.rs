//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use stakepgp_keyserver::DEFAULT_KEYSERVER_URL;
use stakepgp_types::{Address, IdentityPolicy, StakeParams};
use stakepgp_utils::LogFormat;
use stakepgp_verification::RegistryRoots;

use crate::NodeError;

/// Configuration for a StakePGP node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Whether to enable the RPC server.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// Interface the RPC server binds to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: IpAddr,

    /// RPC port (if enabled).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HKP keyserver used for key lookups and uploads.
    #[serde(default = "default_keyserver_url")]
    pub keyserver_url: String,

    /// Account allowed to update the registry and circuit verifiers.
    #[serde(default)]
    pub owner: Option<Address>,

    #[serde(default)]
    pub stake: StakeParams,

    #[serde(default)]
    pub identity: IdentityPolicy,

    /// Roots the identity registry accepts.
    #[serde(default)]
    pub registry: RegistryRoots,

    /// Verifying keys installed at startup.
    #[serde(default)]
    pub verifiers: VerifierConfig,
}

/// snarkjs verifying-key files for the circuits the hub routes to.
///
/// Relative paths resolve against the working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc_and_disclose: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub register: Vec<TypedVerifierKey>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dsc: Vec<TypedVerifierKey>,
}

/// A verifying key for one register or DSC circuit type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedVerifierKey {
    pub type_id: u64,
    pub verifying_key: PathBuf,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./stakepgp_data")
}

fn default_map_size() -> usize {
    stakepgp_store_lmdb::environment::DEFAULT_MAP_SIZE
}

fn default_true() -> bool {
    true
}

fn default_rpc_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_rpc_port() -> u16 {
    7077
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_keyserver_url() -> String {
    DEFAULT_KEYSERVER_URL.to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_host, self.rpc_port)
    }

    /// Directory holding the LMDB environment.
    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    /// Directory holding the local PGP identity.
    pub fn identity_dir(&self) -> PathBuf {
        self.data_dir.join("identity")
    }

    /// The configured owner; a node cannot start without one.
    pub fn require_owner(&self) -> Result<Address, NodeError> {
        match self.owner {
            Some(owner) if !owner.is_zero() => Ok(owner),
            Some(_) => Err(NodeError::Config("owner must not be the zero address".into())),
            None => Err(NodeError::Config("owner address is required".into())),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            enable_rpc: true,
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            keyserver_url: default_keyserver_url(),
            owner: None,
            stake: StakeParams::default(),
            identity: IdentityPolicy::default(),
            registry: RegistryRoots::default(),
            verifiers: VerifierConfig::default(),
        }
    }
}
