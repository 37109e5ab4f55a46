use thiserror::Error;

/// Proof and disclosure failures.
///
/// [`VerificationError::name`] is the identifier clients match on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("vc-and-disclose proof rejected by the circuit verifier")]
    InvalidVcAndDiscloseProof,

    #[error("register proof rejected by the circuit verifier")]
    InvalidRegisterProof,

    #[error("DSC proof rejected by the circuit verifier")]
    InvalidDscProof,

    #[error("proof does not attest the required minimum age")]
    InvalidOlderThan,

    #[error("proof does not attest a passed OFAC check")]
    InvalidOfac,

    #[error("proof was generated against a different forbidden-country list")]
    InvalidForbiddenCountries,

    #[error("no circuit verifier configured")]
    NoVerifierSet,

    #[error("unknown identity commitment root")]
    InvalidCommitmentRoot,

    #[error("unknown CSCA root")]
    InvalidCscaRoot,

    #[error("unknown OFAC root")]
    InvalidOfacRoot,

    #[error("proof date is not within one day of the current date")]
    CurrentDateNotInValidRange,

    #[error("type id and verifier lists differ in length")]
    LengthMismatch,

    #[error("unknown revealed data type {0}")]
    InvalidRevealedDataType(u8),

    #[error("date must have exactly six digits")]
    InvalidDateLength,

    #[error("expected an ASCII digit, got byte {0:#04x}")]
    InvalidAsciiCode(u8),

    #[error("country code must have three characters: {0:?}")]
    InsufficientCharcodeLen(String),

    #[error("commitment already registered for this nullifier")]
    RegisteredCommitment,

    #[error("invalid verifying key: {0}")]
    InvalidVerifyingKey(String),
}

impl VerificationError {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidVcAndDiscloseProof => "INVALID_VC_AND_DISCLOSE_PROOF",
            Self::InvalidRegisterProof => "INVALID_REGISTER_PROOF",
            Self::InvalidDscProof => "INVALID_DSC_PROOF",
            Self::InvalidOlderThan => "INVALID_OLDER_THAN",
            Self::InvalidOfac => "INVALID_OFAC",
            Self::InvalidForbiddenCountries => "INVALID_FORBIDDEN_COUNTRIES",
            Self::NoVerifierSet => "NO_VERIFIER_SET",
            Self::InvalidCommitmentRoot => "INVALID_COMMITMENT_ROOT",
            Self::InvalidCscaRoot => "INVALID_CSCA_ROOT",
            Self::InvalidOfacRoot => "INVALID_OFAC_ROOT",
            Self::CurrentDateNotInValidRange => "CURRENT_DATE_NOT_IN_VALID_RANGE",
            Self::LengthMismatch => "LENGTH_MISMATCH",
            Self::InvalidRevealedDataType(_) => "INVALID_REVEALED_DATA_TYPE",
            Self::InvalidDateLength => "InvalidDateLength",
            Self::InvalidAsciiCode(_) => "InvalidAsciiCode",
            Self::InsufficientCharcodeLen(_) => "INSUFFICIENT_CHARCODE_LEN",
            Self::RegisteredCommitment => "REGISTERED_COMMITMENT",
            Self::InvalidVerifyingKey(_) => "INVALID_VERIFYING_KEY",
        }
    }
}
