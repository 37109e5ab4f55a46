//! Builder for VC-and-disclose proofs that pass the hub's disclosure checks.

use stakepgp_types::{Address, FieldElement, Timestamp};
use stakepgp_verification::date::date_signals;
use stakepgp_verification::proof::vc_and_disclose as layout;
use stakepgp_verification::revealed::{pack_revealed_data, REVEALED_DATA_BYTES};
use stakepgp_verification::VcAndDiscloseProof;

/// Builds proofs for a holder aged `age` who passed the OFAC check, dated
/// for the given time. The Groth16 points are zero; pair with a
/// [`NullVerifier`](crate::NullVerifier).
#[derive(Clone, Debug)]
pub struct ProofBuilder {
    user: Address,
    nullifier: u64,
    date: Timestamp,
    age: u8,
    ofac_passed: bool,
    forbidden_countries: FieldElement,
}

impl ProofBuilder {
    pub fn new(user: Address, date: Timestamp) -> Self {
        Self {
            user,
            nullifier: 1,
            date,
            age: 30,
            ofac_passed: true,
            forbidden_countries: FieldElement::ZERO,
        }
    }

    pub fn nullifier(mut self, nullifier: u64) -> Self {
        self.nullifier = nullifier;
        self
    }

    pub fn age(mut self, age: u8) -> Self {
        self.age = age.min(99);
        self
    }

    pub fn ofac_passed(mut self, passed: bool) -> Self {
        self.ofac_passed = passed;
        self
    }

    pub fn date(mut self, date: Timestamp) -> Self {
        self.date = date;
        self
    }

    pub fn forbidden_countries(mut self, packed: FieldElement) -> Self {
        self.forbidden_countries = packed;
        self
    }

    pub fn build(&self) -> VcAndDiscloseProof {
        let mut bytes = [0u8; REVEALED_DATA_BYTES];
        bytes[88] = b'0' + self.age / 10;
        bytes[89] = b'0' + self.age % 10;
        bytes[90] = u8::from(self.ofac_passed);

        let mut proof = VcAndDiscloseProof::default();
        let packed = pack_revealed_data(&bytes);
        let start = layout::REVEALED_DATA_PACKED_INDEX;
        proof.pub_signals[start..start + layout::REVEALED_DATA_PACKED_LEN].copy_from_slice(&packed);
        proof.pub_signals[layout::FORBIDDEN_COUNTRIES_LIST_PACKED_INDEX] = self.forbidden_countries;
        proof.pub_signals[layout::NULLIFIER_INDEX] = FieldElement::from_u64(self.nullifier);
        proof.pub_signals[layout::ATTESTATION_ID_INDEX] = FieldElement::from_u64(1);
        let date = layout::CURRENT_DATE_INDEX;
        proof.pub_signals[date..date + layout::CURRENT_DATE_LEN]
            .copy_from_slice(&date_signals(self.date));
        proof.pub_signals[layout::USER_IDENTIFIER_INDEX] = FieldElement::from(self.user);
        proof
    }
}
