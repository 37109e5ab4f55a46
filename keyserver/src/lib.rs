//! HKP keyserver client.
//!
//! Fetches armored public keys, searches the machine-readable index, and
//! uploads keys to an OpenPGP keyserver speaking the HTTP Keyserver Protocol.

pub mod client;
pub mod error;
pub mod index;

pub use client::{KeyserverClient, DEFAULT_KEYSERVER_URL};
pub use error::KeyserverError;
pub use index::{parse_index, IndexEntry};
