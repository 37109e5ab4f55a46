//! Argon2id encrypted keystore for armored PGP private keys.
//!
//! 1. Argon2id derives a 32-byte encryption key from the passphrase + random salt
//! 2. AES-256-GCM encrypts the armored key with a random nonce
//! 3. All parameters are kept next to the ciphertext for later decryption

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::SessionError;

const KEYSTORE_VERSION: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

/// Salt length in bytes.
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Argon2id cost parameters, stored with each sealed key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory in KiB.
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MB memory, 3 iterations, 1 lane.
    fn default() -> Self {
        Self {
            memory: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// A passphrase-sealed private key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedKey {
    pub version: u32,
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded nonce.
    pub nonce: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// Seal an armored private key under a passphrase.
pub fn seal_private_key(
    armored: &str,
    passphrase: &str,
    params: KdfParams,
) -> Result<SealedKey, SessionError> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(passphrase, &salt, &params)?;
    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| SessionError::Keystore(format!("AES key init failed: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), armored.as_bytes())
        .map_err(|e| SessionError::Keystore(format!("encryption failed: {e}")))?;

    Ok(SealedKey {
        version: KEYSTORE_VERSION,
        cipher: "aes-256-gcm".to_string(),
        kdf: "argon2id".to_string(),
        kdf_params: params,
        salt: hex::encode(salt),
        nonce: hex::encode(nonce_bytes),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Recover the armored private key from a sealed keystore.
pub fn open_private_key(
    sealed: &SealedKey,
    passphrase: &str,
) -> Result<Zeroizing<String>, SessionError> {
    if sealed.version != KEYSTORE_VERSION {
        return Err(SessionError::Keystore(format!(
            "unsupported keystore version: {}",
            sealed.version
        )));
    }

    let decode = |field: &str, value: &str| {
        hex::decode(value).map_err(|e| SessionError::Keystore(format!("invalid {field} hex: {e}")))
    };
    let salt = decode("salt", &sealed.salt)?;
    let nonce_bytes = decode("nonce", &sealed.nonce)?;
    let ciphertext = decode("ciphertext", &sealed.ciphertext)?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(SessionError::Keystore(format!(
            "invalid nonce length: expected {}, got {}",
            NONCE_LEN,
            nonce_bytes.len()
        )));
    }

    let derived_key = derive_key(passphrase, &salt, &sealed.kdf_params)?;
    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| SessionError::Keystore(format!("AES key init failed: {e}")))?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| SessionError::WrongPassphrase)?,
    );

    let armored = std::str::from_utf8(&plaintext)
        .map_err(|_| SessionError::Keystore("decrypted key is not UTF-8".to_string()))?;
    Ok(Zeroizing::new(armored.to_string()))
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, SessionError> {
    let params = Params::new(
        kdf.memory,
        kdf.iterations,
        kdf.parallelism,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| SessionError::Keystore(format!("Argon2 params error: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut output[..])
        .map_err(|e| SessionError::Keystore(format!("Argon2 hashing failed: {e}")))?;

    Ok(output)
}
