//! Staged writes.
//!
//! A ledger operation validates its preconditions against the store, stages
//! its effects in a [`WriteBatch`] and hands the batch to
//! [`StakeStore::commit`](crate::StakeStore::commit). Dropping a batch
//! without committing discards it.

use stakepgp_types::{Address, FieldElement, KeyId, PassportCommitment, StakeRecord, Wei};

/// A single staged mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    PutStake { staker: Address, record: StakeRecord },
    IndexKey { key: KeyId, staker: Address },
    UnindexKey { key: KeyId },
    BindNullifier { nullifier: FieldElement, staker: Address },
    SetBalance { account: Address, amount: Wei },
    SetCustody { amount: Wei },
    PutPassportCommitment { entry: PassportCommitment },
    PutDscKeyCommitment { commitment: FieldElement },
}

/// An ordered list of mutations applied together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_stake(&mut self, staker: Address, record: StakeRecord) -> &mut Self {
        self.ops.push(WriteOp::PutStake { staker, record });
        self
    }

    pub fn index_key(&mut self, key: KeyId, staker: Address) -> &mut Self {
        self.ops.push(WriteOp::IndexKey { key, staker });
        self
    }

    pub fn unindex_key(&mut self, key: KeyId) -> &mut Self {
        self.ops.push(WriteOp::UnindexKey { key });
        self
    }

    pub fn bind_nullifier(&mut self, nullifier: FieldElement, staker: Address) -> &mut Self {
        self.ops.push(WriteOp::BindNullifier { nullifier, staker });
        self
    }

    pub fn set_balance(&mut self, account: Address, amount: Wei) -> &mut Self {
        self.ops.push(WriteOp::SetBalance { account, amount });
        self
    }

    pub fn set_custody(&mut self, amount: Wei) -> &mut Self {
        self.ops.push(WriteOp::SetCustody { amount });
        self
    }

    pub fn put_passport_commitment(&mut self, entry: PassportCommitment) -> &mut Self {
        self.ops.push(WriteOp::PutPassportCommitment { entry });
        self
    }

    pub fn put_dsc_key_commitment(&mut self, commitment: FieldElement) -> &mut Self {
        self.ops.push(WriteOp::PutDscKeyCommitment { commitment });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
