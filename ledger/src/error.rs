use thiserror::Error;

use stakepgp_types::{Address, TypesError, Wei};
use stakepgp_verification::VerificationError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("address already has an active stake, or the key is staked by another address")]
    AlreadyStaked,

    #[error("stake already has a pending challenge")]
    AlreadyChallenged,

    #[error("no active stake")]
    NoActiveStake,

    #[error("stake is not challenged")]
    NotChallenged,

    #[error("caller is not the challenger")]
    NotChallenger,

    #[error("challenge deadline has passed")]
    ChallengeExpired,

    #[error("challenge is still pending")]
    ChallengePending,

    #[error("stake is locked for another {remaining_secs}s")]
    StakeLocked { remaining_secs: u64 },

    #[error("challenge failed: {0}")]
    ChallengeFailed(String),

    #[error("lock extension must be greater than zero")]
    InvalidExtension,

    #[error("insufficient stake: needed {required}, provided {provided}")]
    InsufficientStake { required: Wei, provided: Wei },

    #[error("insufficient challenge fee: needed {required}, provided {provided}")]
    InsufficientChallengeFee { required: Wei, provided: Wei },

    #[error("account {0} is not authorized")]
    OwnableUnauthorizedAccount(Address),

    #[error("invalid owner {0}")]
    OwnableInvalidOwner(Address),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[source] TypesError),

    #[error("amount overflow")]
    ArithmeticOverflow,

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("storage error: {0}")]
    Storage(#[from] stakepgp_store::StoreError),
}

impl LedgerError {
    /// The identifier clients match on.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AlreadyStaked => "AlreadyStaked",
            Self::AlreadyChallenged => "AlreadyChallenged",
            Self::NoActiveStake => "NoActiveStake",
            Self::NotChallenged => "NotChallenged",
            Self::NotChallenger => "NotChallenger",
            Self::ChallengeExpired => "ChallengeExpired",
            Self::ChallengePending => "ChallengePending",
            Self::StakeLocked { .. } => "StakeLocked",
            Self::ChallengeFailed(_) => "ChallengeFailed",
            Self::InvalidExtension => "InvalidExtension",
            Self::InsufficientStake { .. } => "InsufficientStake",
            Self::InsufficientChallengeFee { .. } => "InsufficientChallengeFee",
            Self::OwnableUnauthorizedAccount(_) => "OwnableUnauthorizedAccount",
            Self::OwnableInvalidOwner(_) => "OwnableInvalidOwner",
            Self::InvalidPublicKey(_) => "InvalidPublicKey",
            Self::ArithmeticOverflow => "ArithmeticOverflow",
            Self::Verification(e) => e.name(),
            Self::Storage(_) => "StorageError",
        }
    }

    /// Failures of the node itself rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::ArithmeticOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_errors_keep_their_names() {
        let err = LedgerError::from(VerificationError::NoVerifierSet);
        assert_eq!(err.name(), "NO_VERIFIER_SET");
        assert!(!err.is_internal());
    }

    #[test]
    fn storage_errors_are_internal() {
        let err = LedgerError::from(stakepgp_store::StoreError::Backend("disk".into()));
        assert_eq!(err.name(), "StorageError");
        assert!(err.is_internal());
    }
}
