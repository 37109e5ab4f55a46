//! StakePGP daemon: entry point for running a node and managing the local
//! PGP identity.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use stakepgp_keyserver::KeyserverClient;
use stakepgp_node::{NodeConfig, StakeNode};
use stakepgp_session::{
    DeclaredKeyInspector, FileIdentityStore, IdentityStore, ImportSource, KdfParams,
    KeyImporter, PrivateKey, Session,
};
use stakepgp_types::Address;
use stakepgp_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "stakepgp-daemon", about = "StakePGP node daemon and identity tools")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "STAKEPGP_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger and identity storage.
    #[arg(long, env = "STAKEPGP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// RPC server port.
    #[arg(long, env = "STAKEPGP_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Disable the RPC server.
    #[arg(long, env = "STAKEPGP_DISABLE_RPC")]
    no_rpc: bool,

    /// Ledger owner address (admin for registry and verifier updates).
    #[arg(long, env = "STAKEPGP_OWNER")]
    owner: Option<Address>,

    /// HKP keyserver URL.
    #[arg(long, env = "STAKEPGP_KEYSERVER")]
    keyserver: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKEPGP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKEPGP_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Keyserver lookups and uploads.
    #[command(name = "keys")]
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// The local PGP identity.
    #[command(name = "identity")]
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

#[derive(clap::Subcommand)]
enum KeysAction {
    /// Print the armored public key for a key id or fingerprint.
    Fetch { key_id: String },
    /// Print the keyserver index entries matching a key id or fingerprint.
    Search { key_id: String },
    /// Upload an armored public key file.
    Publish { file: PathBuf },
}

#[derive(clap::Subcommand)]
enum IdentityAction {
    /// Show the stored identity.
    Show,
    /// Import an identity, by fingerprint lookup or from an armored key file.
    Import {
        /// Wallet address the session is connected as.
        #[arg(long)]
        wallet: Address,
        /// Look the key up on the keyserver.
        #[arg(long, conflicts_with = "public_key_file")]
        fingerprint: Option<String>,
        /// Armored public key file.
        #[arg(long, requires = "key_fingerprint", requires = "user_id")]
        public_key_file: Option<PathBuf>,
        /// Armored private key file to keep with the identity.
        #[arg(long, requires = "public_key_file")]
        private_key_file: Option<PathBuf>,
        /// Fingerprint of the key in `--public-key-file`.
        #[arg(long)]
        key_fingerprint: Option<String>,
        /// User id of the key in `--public-key-file`, "Name <email>".
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Seal the stored private key with a passphrase.
    Seal {
        #[arg(long)]
        wallet: Address,
        #[arg(long, env = "STAKEPGP_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },
    /// Delete the stored identity.
    Logout,
}

/// Merge the config file (if any) with CLI flags and env vars.
fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if cli.no_rpc {
        config.enable_rpc = false;
    }
    if let Some(owner) = cli.owner {
        config.owner = Some(owner);
    }
    if let Some(url) = &cli.keyserver {
        config.keyserver_url = url.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting StakePGP node (RPC:{}, data:{})",
        if config.enable_rpc {
            config.rpc_addr().to_string()
        } else {
            "off".into()
        },
        config.data_dir.display(),
    );
    let node = StakeNode::new(config)?;
    node.run().await?;
    Ok(())
}

async fn keys(config: &NodeConfig, action: KeysAction) -> anyhow::Result<()> {
    let client = KeyserverClient::new(&config.keyserver_url);
    match action {
        KeysAction::Fetch { key_id } => {
            print!("{}", client.fetch_key(&key_id).await?);
        }
        KeysAction::Search { key_id } => {
            let entries = client.search_index(&key_id).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        KeysAction::Publish { file } => {
            client.publish(&read_file(&file)?).await?;
            println!("published {}", file.display());
        }
    }
    Ok(())
}

async fn identity(config: &NodeConfig, action: IdentityAction) -> anyhow::Result<()> {
    let store = Arc::new(FileIdentityStore::new(config.identity_dir()));
    match action {
        IdentityAction::Show => match store.load()? {
            Some(identity) => {
                println!("key id:      {}", identity.key_id);
                println!("user:        {}", identity.user_info());
                let private = match &identity.private_key {
                    None => "none",
                    Some(PrivateKey::Armored(_)) => "present (unsealed)",
                    Some(PrivateKey::Sealed(_)) => "present (sealed)",
                };
                println!("private key: {private}");
            }
            None => println!("no identity stored in {}", store.path().display()),
        },
        IdentityAction::Import {
            wallet,
            fingerprint,
            public_key_file,
            private_key_file,
            key_fingerprint,
            user_id,
        } => {
            let (source, inspector) = match (fingerprint, public_key_file) {
                (Some(fingerprint), None) => {
                    // Metadata comes from the keyserver index for this source.
                    let inspector = DeclaredKeyInspector::new(&fingerprint, "")?;
                    (ImportSource::Fingerprint(fingerprint), inspector)
                }
                (None, Some(file)) => {
                    let private_key = private_key_file.as_deref().map(read_file).transpose()?;
                    let inspector = DeclaredKeyInspector::new(
                        key_fingerprint.as_deref().unwrap_or_default(),
                        user_id.unwrap_or_default(),
                    )?;
                    (
                        ImportSource::Armored {
                            public_key: read_file(&file)?,
                            private_key,
                        },
                        inspector,
                    )
                }
                _ => bail!("pass exactly one of --fingerprint or --public-key-file"),
            };

            let importer = KeyImporter::new(
                KeyserverClient::new(&config.keyserver_url),
                Arc::new(inspector),
            );
            let mut session = Session::new(store);
            session.connect(wallet)?;
            let identity = session.import(&importer, source).await?;
            println!("imported {} ({})", identity.key_id, identity.user_info());
        }
        IdentityAction::Seal { wallet, passphrase } => {
            let mut session = Session::new(store);
            session.connect(wallet)?;
            session.seal_private_key(&passphrase, KdfParams::default())?;
            println!("private key sealed");
        }
        IdentityAction::Logout => {
            let mut session = Session::new(store);
            session.logout()?;
            println!("identity removed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Run => run_node(config).await,
        },
        Command::Keys { action } => keys(&config, action).await,
        Command::Identity { action } => identity(&config, action).await,
    }
}
