//! Nullable store: thread-safe in-memory storage for testing.

use stakepgp_store::{StakeStore, StoreError, WriteBatch, WriteOp};
use stakepgp_types::{Address, FieldElement, KeyId, PassportCommitment, StakeRecord, Wei};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
struct State {
    stakes: BTreeMap<Address, StakeRecord>,
    keys: HashMap<KeyId, Address>,
    nullifiers: HashMap<FieldElement, Address>,
    balances: HashMap<Address, Wei>,
    custody: Wei,
    commitments: BTreeMap<FieldElement, PassportCommitment>,
    dsc_commitments: BTreeSet<FieldElement>,
}

/// An in-memory stake store for testing.
///
/// Batches apply all-or-nothing, like the LMDB store. Commits can be made to
/// fail on demand to exercise rollback paths.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    fail_commits: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `commit` fail with a backend error.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StakeStore for NullStore {
    fn get_stake(&self, staker: &Address) -> Result<Option<StakeRecord>, StoreError> {
        Ok(self.lock().stakes.get(staker).cloned())
    }

    fn staker_for_key(&self, key: &KeyId) -> Result<Option<Address>, StoreError> {
        Ok(self.lock().keys.get(key).copied())
    }

    fn nullifier_owner(&self, nullifier: &FieldElement) -> Result<Option<Address>, StoreError> {
        Ok(self.lock().nullifiers.get(nullifier).copied())
    }

    fn balance(&self, account: &Address) -> Result<Wei, StoreError> {
        Ok(self.lock().balances.get(account).copied().unwrap_or_default())
    }

    fn custody(&self) -> Result<Wei, StoreError> {
        Ok(self.lock().custody)
    }

    fn all_stakes(&self) -> Result<Vec<(Address, StakeRecord)>, StoreError> {
        Ok(self
            .lock()
            .stakes
            .iter()
            .map(|(a, r)| (*a, r.clone()))
            .collect())
    }

    fn passport_commitment(
        &self,
        nullifier: &FieldElement,
    ) -> Result<Option<PassportCommitment>, StoreError> {
        Ok(self.lock().commitments.get(nullifier).copied())
    }

    fn passport_commitments(&self) -> Result<Vec<PassportCommitment>, StoreError> {
        Ok(self.lock().commitments.values().copied().collect())
    }

    fn has_dsc_key_commitment(&self, commitment: &FieldElement) -> Result<bool, StoreError> {
        Ok(self.lock().dsc_commitments.contains(commitment))
    }

    fn dsc_key_commitments(&self) -> Result<Vec<FieldElement>, StoreError> {
        Ok(self.lock().dsc_commitments.iter().copied().collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("commit disabled".into()));
        }
        let mut guard = self.lock();
        let mut next = guard.clone();
        for op in batch.into_ops() {
            match op {
                WriteOp::PutStake { staker, record } => {
                    next.stakes.insert(staker, record);
                }
                WriteOp::IndexKey { key, staker } => {
                    next.keys.insert(key, staker);
                }
                WriteOp::UnindexKey { key } => {
                    next.keys.remove(&key);
                }
                WriteOp::BindNullifier { nullifier, staker } => {
                    next.nullifiers.insert(nullifier, staker);
                }
                WriteOp::SetBalance { account, amount } => {
                    if amount.is_zero() {
                        next.balances.remove(&account);
                    } else {
                        next.balances.insert(account, amount);
                    }
                }
                WriteOp::SetCustody { amount } => next.custody = amount,
                WriteOp::PutPassportCommitment { entry } => {
                    next.commitments.insert(entry.nullifier, entry);
                }
                WriteOp::PutDscKeyCommitment { commitment } => {
                    next.dsc_commitments.insert(commitment);
                }
            }
        }
        *guard = next;
        Ok(())
    }
}
