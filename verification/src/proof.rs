//! Groth16 proof payloads and their public-signal layouts.

use serde::{Deserialize, Serialize};
use stakepgp_types::FieldElement;

/// Public signals of a VC-and-disclose proof.
pub mod vc_and_disclose {
    /// Three field elements of packed MRZ disclosures.
    pub const REVEALED_DATA_PACKED_INDEX: usize = 0;
    pub const REVEALED_DATA_PACKED_LEN: usize = 3;
    pub const FORBIDDEN_COUNTRIES_LIST_PACKED_INDEX: usize = 3;
    pub const NULLIFIER_INDEX: usize = 4;
    pub const ATTESTATION_ID_INDEX: usize = 5;
    pub const MERKLE_ROOT_INDEX: usize = 6;
    /// Six single-digit signals: `Y Y M M D D`.
    pub const CURRENT_DATE_INDEX: usize = 7;
    pub const CURRENT_DATE_LEN: usize = 6;
    pub const SMT_ROOT_INDEX: usize = 13;
    pub const SCOPE_INDEX: usize = 14;
    pub const USER_IDENTIFIER_INDEX: usize = 15;
    pub const PUB_SIGNALS_LEN: usize = 16;
}

/// Public signals of a passport register proof.
pub mod register {
    pub const NULLIFIER_INDEX: usize = 0;
    pub const COMMITMENT_INDEX: usize = 1;
    pub const DSC_TREE_ROOT_INDEX: usize = 2;
    pub const PUB_SIGNALS_LEN: usize = 3;
}

/// Public signals of a DSC key proof.
pub mod dsc {
    pub const BLINDED_DSC_COMMITMENT_INDEX: usize = 0;
    pub const CSCA_ROOT_INDEX: usize = 1;
    pub const PUB_SIGNALS_LEN: usize = 2;
}

/// Selective-disclosure proof submitted by a challenged staker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcAndDiscloseProof {
    pub a: [FieldElement; 2],
    pub b: [[FieldElement; 2]; 2],
    pub c: [FieldElement; 2],
    pub pub_signals: [FieldElement; vc_and_disclose::PUB_SIGNALS_LEN],
}

impl VcAndDiscloseProof {
    fn signal(&self, index: usize) -> FieldElement {
        self.pub_signals[index]
    }

    pub fn revealed_data_packed(&self) -> [FieldElement; 3] {
        let start = vc_and_disclose::REVEALED_DATA_PACKED_INDEX;
        [
            self.signal(start),
            self.signal(start + 1),
            self.signal(start + 2),
        ]
    }

    pub fn forbidden_countries_list_packed(&self) -> FieldElement {
        self.signal(vc_and_disclose::FORBIDDEN_COUNTRIES_LIST_PACKED_INDEX)
    }

    pub fn nullifier(&self) -> FieldElement {
        self.signal(vc_and_disclose::NULLIFIER_INDEX)
    }

    pub fn attestation_id(&self) -> FieldElement {
        self.signal(vc_and_disclose::ATTESTATION_ID_INDEX)
    }

    pub fn merkle_root(&self) -> FieldElement {
        self.signal(vc_and_disclose::MERKLE_ROOT_INDEX)
    }

    pub fn current_date(&self) -> &[FieldElement] {
        let start = vc_and_disclose::CURRENT_DATE_INDEX;
        &self.pub_signals[start..start + vc_and_disclose::CURRENT_DATE_LEN]
    }

    pub fn smt_root(&self) -> FieldElement {
        self.signal(vc_and_disclose::SMT_ROOT_INDEX)
    }

    pub fn scope(&self) -> FieldElement {
        self.signal(vc_and_disclose::SCOPE_INDEX)
    }

    pub fn user_identifier(&self) -> FieldElement {
        self.signal(vc_and_disclose::USER_IDENTIFIER_INDEX)
    }
}

/// Proof that a passport commitment was derived from a registered DSC.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProof {
    pub a: [FieldElement; 2],
    pub b: [[FieldElement; 2]; 2],
    pub c: [FieldElement; 2],
    pub pub_signals: [FieldElement; register::PUB_SIGNALS_LEN],
}

/// Proof that a DSC key was signed by a known CSCA.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DscProof {
    pub a: [FieldElement; 2],
    pub b: [[FieldElement; 2]; 2],
    pub c: [FieldElement; 2],
    pub pub_signals: [FieldElement; dsc::PUB_SIGNALS_LEN],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_follow_signal_layout() {
        let mut proof = VcAndDiscloseProof::default();
        for (i, signal) in proof.pub_signals.iter_mut().enumerate() {
            *signal = FieldElement::from_u64(100 + i as u64);
        }
        assert_eq!(proof.revealed_data_packed()[2], FieldElement::from_u64(102));
        assert_eq!(proof.forbidden_countries_list_packed(), FieldElement::from_u64(103));
        assert_eq!(proof.nullifier(), FieldElement::from_u64(104));
        assert_eq!(proof.merkle_root(), FieldElement::from_u64(106));
        assert_eq!(proof.current_date().len(), 6);
        assert_eq!(proof.current_date()[0], FieldElement::from_u64(107));
        assert_eq!(proof.smt_root(), FieldElement::from_u64(113));
        assert_eq!(proof.user_identifier(), FieldElement::from_u64(115));
    }

    #[test]
    fn json_uses_camel_case_and_decimal_strings() {
        let json = serde_json::json!({
            "a": ["1", "2"],
            "b": [["3", "4"], ["5", "6"]],
            "c": ["7", "0x08"],
            "pubSignals": ["1", "2", "3"],
        });
        let proof: RegisterProof = serde_json::from_value(json).unwrap();
        assert_eq!(proof.c[1], FieldElement::from_u64(8));
        assert_eq!(proof.pub_signals[2], FieldElement::from_u64(3));
    }
}
