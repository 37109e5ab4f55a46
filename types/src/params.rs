//! Staking parameters and the identity policy applied to challenge proofs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{TypesError, Wei};

const DAY_SECS: u64 = 24 * 3600;

/// What happens to a challenger's fee when the staker answers the challenge
/// with a valid identity proof.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeDisposition {
    /// The fee is credited to the staker who was wrongly challenged.
    #[default]
    ForfeitToStaker,
    /// The fee goes back to the challenger.
    RefundToChallenger,
}

impl FeeDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForfeitToStaker => "forfeit_to_staker",
            Self::RefundToChallenger => "refund_to_challenger",
        }
    }
}

impl fmt::Display for FeeDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeDisposition {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "forfeit_to_staker" | "staker" => Ok(Self::ForfeitToStaker),
            "refund_to_challenger" | "challenger" => Ok(Self::RefundToChallenger),
            other => Err(TypesError::UnknownFeeDisposition(other.to_string())),
        }
    }
}

/// The ledger's constants.
///
/// `MINIMUM_STAKE`, `CHALLENGE_FEE`, `CHALLENGE_DURATION` and
/// `MINIMUM_STAKE_DURATION` are fixed for the lifetime of a ledger; they are
/// configurable only so test networks can shorten the windows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeParams {
    /// Smallest stake accepted by `stake`.
    #[serde(default = "default_minimum_stake")]
    pub minimum_stake: Wei,

    /// Smallest fee accepted by `challenge`.
    #[serde(default = "default_challenge_fee")]
    pub challenge_fee: Wei,

    /// Seconds a staker has to answer a challenge.
    #[serde(default = "default_challenge_duration")]
    pub challenge_duration_secs: u64,

    /// Seconds a stake stays locked after it is created.
    #[serde(default = "default_minimum_stake_duration")]
    pub minimum_stake_duration_secs: u64,

    /// Where the challenge fee goes when the staker proves their identity.
    #[serde(default)]
    pub fee_disposition: FeeDisposition,
}

fn default_minimum_stake() -> Wei {
    StakeParams::MINIMUM_STAKE
}

fn default_challenge_fee() -> Wei {
    StakeParams::CHALLENGE_FEE
}

fn default_challenge_duration() -> u64 {
    StakeParams::CHALLENGE_DURATION_SECS
}

fn default_minimum_stake_duration() -> u64 {
    StakeParams::MINIMUM_STAKE_DURATION_SECS
}

impl StakeParams {
    /// 0.1 ETH.
    pub const MINIMUM_STAKE: Wei = Wei::from_milli_eth(100);
    /// 0.05 ETH.
    pub const CHALLENGE_FEE: Wei = Wei::from_milli_eth(50);
    /// 7 days.
    pub const CHALLENGE_DURATION_SECS: u64 = 7 * DAY_SECS;
    /// 30 days.
    pub const MINIMUM_STAKE_DURATION_SECS: u64 = 30 * DAY_SECS;
}

impl Default for StakeParams {
    fn default() -> Self {
        Self {
            minimum_stake: Self::MINIMUM_STAKE,
            challenge_fee: Self::CHALLENGE_FEE,
            challenge_duration_secs: Self::CHALLENGE_DURATION_SECS,
            minimum_stake_duration_secs: Self::MINIMUM_STAKE_DURATION_SECS,
            fee_disposition: FeeDisposition::default(),
        }
    }
}

/// Which disclosures an identity proof must carry to resolve a challenge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPolicy {
    /// Minimum age attested by the proof; `0` disables the check.
    #[serde(default = "default_older_than")]
    pub older_than: u32,

    /// Require the OFAC sanctions-list check to have passed.
    #[serde(default = "default_true")]
    pub ofac_enabled: bool,

    /// ISO 3166 alpha-3 codes the proof must have been generated against.
    /// Empty disables the check.
    #[serde(default)]
    pub forbidden_countries: Vec<String>,

    /// Require the proof's user identifier to equal the submitting address.
    #[serde(default = "default_true")]
    pub bind_user_identifier: bool,
}

fn default_older_than() -> u32 {
    18
}

fn default_true() -> bool {
    true
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            older_than: default_older_than(),
            ofac_enabled: true,
            forbidden_countries: Vec::new(),
            bind_user_identifier: true,
        }
    }
}
