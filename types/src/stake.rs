//! The per-staker record kept by the ledger.

use serde::{Deserialize, Serialize};

use crate::{Address, KeyId, StakeParams, Timestamp, Wei};

/// A staker's record.
///
/// A record is either inactive (`is_staked == false`, everything else zeroed)
/// or active. An active record has at most one outstanding challenge, and
/// `challenger.is_some()` exactly when `challenge_deadline` is not the epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    /// PGP key material or fingerprint exactly as submitted.
    pub public_key: String,
    /// Index key derived from `public_key`.
    pub key_id: Option<KeyId>,
    pub staked_amount: Wei,
    pub stake_timestamp: Timestamp,
    pub challenger: Option<Address>,
    pub challenge_deadline: Timestamp,
    pub challenge_fee: Wei,
    pub is_staked: bool,
    /// Seconds added to the lock by `extend_lock`.
    pub lock_extension: u64,
}

impl StakeRecord {
    /// A freshly created active stake.
    pub fn new(public_key: String, key_id: KeyId, amount: Wei, now: Timestamp) -> Self {
        Self {
            public_key,
            key_id: Some(key_id),
            staked_amount: amount,
            stake_timestamp: now,
            challenger: None,
            challenge_deadline: Timestamp::EPOCH,
            challenge_fee: Wei::ZERO,
            is_staked: true,
            lock_extension: 0,
        }
    }

    pub fn is_challenged(&self) -> bool {
        self.challenger.is_some()
    }

    /// Active and open to a new challenge.
    pub fn is_challengeable(&self) -> bool {
        self.is_staked && !self.is_challenged()
    }

    /// When the stake may first be withdrawn (inclusive).
    pub fn unlock_time(&self, params: &StakeParams) -> Timestamp {
        self.stake_timestamp
            .plus(params.minimum_stake_duration_secs)
            .plus(self.lock_extension)
    }

    /// Seconds until the stake unlocks; zero for inactive or unlocked stakes.
    pub fn remaining_lock(&self, params: &StakeParams, now: Timestamp) -> u64 {
        if !self.is_staked {
            return 0;
        }
        self.unlock_time(params).remaining_from(now)
    }

    /// Clear the outstanding challenge, returning the challenger and fee.
    pub fn clear_challenge(&mut self) -> Option<(Address, Wei)> {
        let challenger = self.challenger.take()?;
        let fee = std::mem::replace(&mut self.challenge_fee, Wei::ZERO);
        self.challenge_deadline = Timestamp::EPOCH;
        Some((challenger, fee))
    }

    /// The public read view of this record.
    pub fn view(&self) -> StakeView {
        StakeView {
            public_key: self.public_key.clone(),
            staked_amount: self.staked_amount,
            challenge_deadline: self.challenge_deadline,
            stake_timestamp: self.stake_timestamp,
            challenger: self.challenger.unwrap_or(Address::ZERO),
            challenge_fee: self.challenge_fee,
            is_staked: self.is_staked,
        }
    }
}

/// The `stakes(address)` read: seven fields in ABI order, with the zero
/// address standing in for "no challenger".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeView {
    pub public_key: String,
    pub staked_amount: Wei,
    pub challenge_deadline: Timestamp,
    pub stake_timestamp: Timestamp,
    pub challenger: Address,
    pub challenge_fee: Wei,
    pub is_staked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> StakeRecord {
        StakeRecord::new(
            "ABCD1234".into(),
            KeyId::normalize("ABCD1234").unwrap(),
            Wei::from_milli_eth(200),
            Timestamp::new(1_000),
        )
    }

    #[test]
    fn empty_view_reports_zero_challenger() {
        let view = StakeView::default();
        assert_eq!(view.challenger, Address::ZERO);
        assert!(!view.is_staked);
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn unlock_time_includes_extension() {
        let params = StakeParams::default();
        let mut record = active();
        assert_eq!(record.unlock_time(&params), Timestamp::new(1_000 + 2_592_000));
        record.lock_extension = 60;
        assert_eq!(record.unlock_time(&params), Timestamp::new(1_000 + 2_592_060));
    }

    #[test]
    fn remaining_lock_is_zero_when_inactive() {
        let params = StakeParams::default();
        let mut record = active();
        assert_eq!(record.remaining_lock(&params, Timestamp::new(1_000)), 2_592_000);
        record.is_staked = false;
        assert_eq!(record.remaining_lock(&params, Timestamp::new(1_000)), 0);
    }

    #[test]
    fn clear_challenge_resets_fields() {
        let mut record = active();
        let b = Address::new([2; 20]);
        record.challenger = Some(b);
        record.challenge_deadline = Timestamp::new(5_000);
        record.challenge_fee = Wei::from_milli_eth(50);
        assert!(!record.is_challengeable());

        assert_eq!(record.clear_challenge(), Some((b, Wei::from_milli_eth(50))));
        assert!(record.challenge_deadline.is_epoch());
        assert!(record.challenge_fee.is_zero());
        assert!(record.is_challengeable());
        assert_eq!(record.clear_challenge(), None);
    }

    #[test]
    fn view_reports_zero_address_without_challenger() {
        let view = active().view();
        assert!(view.challenger.is_zero());
        assert!(view.is_staked);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["stakedAmount"], "200000000000000000");
        assert_eq!(json["isStaked"], true);
    }
}
