use stakepgp_keyserver::KeyserverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no wallet connected")]
    NotConnected,

    #[error("no PGP identity in this session")]
    NoIdentity,

    #[error("invalid PGP key: {0}")]
    InvalidKey(String),

    #[error("key has no usable user id: {0}")]
    InvalidUserId(String),

    #[error("identity has no private key")]
    NoPrivateKey,

    #[error("private key is not sealed")]
    NotSealed,

    #[error("private key is already sealed")]
    AlreadySealed,

    #[error("wrong passphrase or corrupted keystore")]
    WrongPassphrase,

    #[error("keystore error: {0}")]
    Keystore(String),

    #[error(transparent)]
    Keyserver(#[from] KeyserverError),

    #[error("identity store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
