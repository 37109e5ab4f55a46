//! Identity commitments registered through register proofs.

use serde::{Deserialize, Serialize};

use crate::FieldElement;

/// A passport identity commitment, keyed by the nullifier of the register
/// proof that introduced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportCommitment {
    pub attestation_id: FieldElement,
    pub nullifier: FieldElement,
    pub commitment: FieldElement,
}
