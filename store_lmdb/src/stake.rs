//! LMDB implementation of StakeStore.
//!
//! Tables:
//! - `stakes`: address bytes → bincode `StakeRecord`
//! - `key_index`: key id (UTF-8) → address bytes
//! - `nullifiers`: 32-byte nullifier → address bytes
//! - `balances`: address bytes → u128 little-endian
//! - `meta["custody"]`: u128 little-endian
//! - `commitments`: 32-byte nullifier → bincode `PassportCommitment`
//! - `dsc_commitments`: 32-byte commitment → empty value

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RwTxn};

use stakepgp_store::{StakeStore, StoreError, WriteBatch, WriteOp};
use stakepgp_types::{Address, FieldElement, KeyId, PassportCommitment, StakeRecord, Wei};

use crate::LmdbError;

const CUSTODY_KEY: &[u8] = b"custody";

pub struct LmdbStakeStore {
    pub(crate) env: Arc<Env>,
    pub(crate) stakes_db: Database<Bytes, Bytes>,
    pub(crate) key_index_db: Database<Bytes, Bytes>,
    pub(crate) nullifiers_db: Database<Bytes, Bytes>,
    pub(crate) balances_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) commitments_db: Database<Bytes, Bytes>,
    pub(crate) dsc_commitments_db: Database<Bytes, Bytes>,
}

fn decode_address(bytes: &[u8]) -> Result<Address, LmdbError> {
    let arr: [u8; 20] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("address has {} bytes", bytes.len())))?;
    Ok(Address::new(arr))
}

fn decode_field(bytes: &[u8]) -> Result<FieldElement, LmdbError> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("field element has {} bytes", bytes.len())))?;
    Ok(FieldElement::from_be_bytes(arr))
}

fn decode_wei(bytes: &[u8]) -> Result<Wei, LmdbError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("amount has {} bytes", bytes.len())))?;
    Ok(Wei::new(u128::from_le_bytes(arr)))
}

impl LmdbStakeStore {
    fn lookup_address(
        &self,
        db: &Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<Address>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        db.get(&rtxn, key)?.map(decode_address).transpose()
    }

    fn apply(&self, wtxn: &mut RwTxn<'_>, op: WriteOp) -> Result<(), LmdbError> {
        match op {
            WriteOp::PutStake { staker, record } => {
                let bytes = bincode::serialize(&record)?;
                self.stakes_db.put(wtxn, staker.as_bytes(), &bytes)?;
            }
            WriteOp::IndexKey { key, staker } => {
                self.key_index_db
                    .put(wtxn, key.as_str().as_bytes(), staker.as_bytes())?;
            }
            WriteOp::UnindexKey { key } => {
                self.key_index_db.delete(wtxn, key.as_str().as_bytes())?;
            }
            WriteOp::BindNullifier { nullifier, staker } => {
                self.nullifiers_db
                    .put(wtxn, nullifier.as_be_bytes(), staker.as_bytes())?;
            }
            WriteOp::SetBalance { account, amount } => {
                if amount.is_zero() {
                    self.balances_db.delete(wtxn, account.as_bytes())?;
                } else {
                    self.balances_db
                        .put(wtxn, account.as_bytes(), &amount.raw().to_le_bytes())?;
                }
            }
            WriteOp::SetCustody { amount } => {
                self.meta_db
                    .put(wtxn, CUSTODY_KEY, &amount.raw().to_le_bytes())?;
            }
            WriteOp::PutPassportCommitment { entry } => {
                let bytes = bincode::serialize(&entry)?;
                self.commitments_db
                    .put(wtxn, entry.nullifier.as_be_bytes(), &bytes)?;
            }
            WriteOp::PutDscKeyCommitment { commitment } => {
                self.dsc_commitments_db
                    .put(wtxn, commitment.as_be_bytes(), &[])?;
            }
        }
        Ok(())
    }
}

impl StakeStore for LmdbStakeStore {
    fn get_stake(&self, staker: &Address) -> Result<Option<StakeRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .stakes_db
            .get(&rtxn, staker.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let record = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn staker_for_key(&self, key: &KeyId) -> Result<Option<Address>, StoreError> {
        Ok(self.lookup_address(&self.key_index_db, key.as_str().as_bytes())?)
    }

    fn nullifier_owner(&self, nullifier: &FieldElement) -> Result<Option<Address>, StoreError> {
        Ok(self.lookup_address(&self.nullifiers_db, nullifier.as_be_bytes())?)
    }

    fn balance(&self, account: &Address) -> Result<Wei, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .balances_db
            .get(&rtxn, account.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(decode_wei(bytes)?),
            None => Ok(Wei::ZERO),
        }
    }

    fn custody(&self) -> Result<Wei, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, CUSTODY_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(decode_wei(bytes)?),
            None => Ok(Wei::ZERO),
        }
    }

    fn all_stakes(&self) -> Result<Vec<(Address, StakeRecord)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.stakes_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            let address = decode_address(key)?;
            let record: StakeRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            out.push((address, record));
        }
        Ok(out)
    }

    fn passport_commitment(
        &self,
        nullifier: &FieldElement,
    ) -> Result<Option<PassportCommitment>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .commitments_db
            .get(&rtxn, nullifier.as_be_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn passport_commitments(&self) -> Result<Vec<PassportCommitment>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.commitments_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in iter {
            let (_, val) = entry.map_err(LmdbError::from)?;
            out.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(out)
    }

    fn has_dsc_key_commitment(&self, commitment: &FieldElement) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .dsc_commitments_db
            .get(&rtxn, commitment.as_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(found.is_some())
    }

    fn dsc_key_commitments(&self) -> Result<Vec<FieldElement>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.dsc_commitments_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            out.push(decode_field(key)?);
        }
        Ok(out)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in batch.into_ops() {
            // An error here drops `wtxn` uncommitted, aborting the whole batch.
            self.apply(&mut wtxn, op)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(ops = count, "committed write batch");
        Ok(())
    }
}
