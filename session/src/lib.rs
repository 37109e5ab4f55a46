//! The local PGP identity a wallet stakes with.
//!
//! A [`Session`] owns the identity for as long as a wallet is connected:
//! `connect` loads it from an [`IdentityStore`], `disconnect` drops it from
//! memory and `logout` deletes it. Keys enter the session through one
//! [`KeyImporter`], either looked up on a keyserver by fingerprint or pasted
//! as armored text.

pub mod error;
pub mod identity;
pub mod import;
pub mod inspect;
pub mod keystore;
pub mod session;
pub mod store;

pub use error::SessionError;
pub use identity::{parse_user_id, PgpIdentity, PrivateKey, UserId};
pub use import::{ImportSource, KeyImporter};
pub use inspect::{DeclaredKeyInspector, KeyInspector, KeyMetadata};
pub use keystore::{open_private_key, seal_private_key, KdfParams, SealedKey};
pub use session::Session;
pub use store::{FileIdentityStore, IdentityStore, MemoryIdentityStore, IDENTITY_ID};
