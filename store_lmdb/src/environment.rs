//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::stake::LmdbStakeStore;
use crate::LmdbError;

/// Number of named databases opened by [`LmdbEnvironment::open`].
const MAX_DBS: u32 = 8;

/// Default map size: 1 GiB. Records are small; this is address space, not disk.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) stakes_db: Database<Bytes, Bytes>,
    pub(crate) key_index_db: Database<Bytes, Bytes>,
    pub(crate) nullifiers_db: Database<Bytes, Bytes>,
    pub(crate) balances_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) commitments_db: Database<Bytes, Bytes>,
    pub(crate) dsc_commitments_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory and bring
    /// its schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this process; LMDB's
        // requirement is that the same path is not opened twice in one process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let stakes_db = env.create_database(&mut wtxn, Some("stakes"))?;
        let key_index_db = env.create_database(&mut wtxn, Some("key_index"))?;
        let nullifiers_db = env.create_database(&mut wtxn, Some("nullifiers"))?;
        let balances_db = env.create_database(&mut wtxn, Some("balances"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        let commitments_db = env.create_database(&mut wtxn, Some("commitments"))?;
        let dsc_commitments_db = env.create_database(&mut wtxn, Some("dsc_commitments"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            stakes_db,
            key_index_db,
            nullifiers_db,
            balances_db,
            meta_db,
            commitments_db,
            dsc_commitments_db,
        };

        Migrator::run(&environment.meta_store())?;
        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(environment)
    }

    /// Stake tables view.
    pub fn stake_store(&self) -> LmdbStakeStore {
        LmdbStakeStore {
            env: Arc::clone(&self.env),
            stakes_db: self.stakes_db,
            key_index_db: self.key_index_db,
            nullifiers_db: self.nullifiers_db,
            balances_db: self.balances_db,
            meta_db: self.meta_db,
            commitments_db: self.commitments_db,
            dsc_commitments_db: self.dsc_commitments_db,
        }
    }

    /// Metadata table view.
    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
