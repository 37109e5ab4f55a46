//! Stake ledger storage trait.

use stakepgp_types::{Address, FieldElement, KeyId, PassportCommitment, StakeRecord, Wei};

use crate::{StoreError, WriteBatch};

/// Storage for stake records and the indexes derived from them.
///
/// Implementations must be safe to share across threads; the ledger holds the
/// store behind an `Arc`.
pub trait StakeStore: Send + Sync {
    /// The record for `staker`, active or not. `None` if the address never staked.
    fn get_stake(&self, staker: &Address) -> Result<Option<StakeRecord>, StoreError>;

    /// The staker currently holding `key`.
    fn staker_for_key(&self, key: &KeyId) -> Result<Option<Address>, StoreError>;

    /// The staker a passport nullifier has been bound to.
    fn nullifier_owner(&self, nullifier: &FieldElement) -> Result<Option<Address>, StoreError>;

    /// Credited, withdrawable value for `account`.
    fn balance(&self, account: &Address) -> Result<Wei, StoreError>;

    /// Total value held by the ledger (active stakes plus pending fees).
    fn custody(&self) -> Result<Wei, StoreError>;

    /// Every record ever written, ordered by address.
    fn all_stakes(&self) -> Result<Vec<(Address, StakeRecord)>, StoreError>;

    /// The passport commitment registered under `nullifier`.
    fn passport_commitment(
        &self,
        nullifier: &FieldElement,
    ) -> Result<Option<PassportCommitment>, StoreError>;

    /// Every registered passport commitment, ordered by nullifier.
    fn passport_commitments(&self) -> Result<Vec<PassportCommitment>, StoreError>;

    fn has_dsc_key_commitment(&self, commitment: &FieldElement) -> Result<bool, StoreError>;

    /// Every registered DSC key commitment, in ascending order.
    fn dsc_key_commitments(&self) -> Result<Vec<FieldElement>, StoreError>;

    /// Apply every operation in `batch` atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
