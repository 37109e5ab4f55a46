//! Routes proofs to circuit verifiers and enforces disclosure policy.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stakepgp_types::{FieldElement, IdentityPolicy, PassportCommitment, Timestamp};

use crate::date::check_current_date;
use crate::proof::{dsc, register, DscProof, RegisterProof, VcAndDiscloseProof};
use crate::revealed::{self, pack_forbidden_countries, unpack_revealed_data};
use crate::{CircuitVerifier, IdentityRegistry, VerificationError};

/// Attestation id of an electronic passport.
pub const PASSPORT_ATTESTATION_ID: u64 = 1;

/// Value of the OFAC byte when the holder passed the sanctions check.
const OFAC_PASSED: u8 = 1;

/// Which disclosures a VC-and-disclose proof must satisfy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcAndDiscloseOptions {
    pub older_than_enabled: bool,
    pub older_than: u32,
    pub forbidden_countries_enabled: bool,
    pub forbidden_countries_list_packed: FieldElement,
    pub ofac_enabled: bool,
}

impl VcAndDiscloseOptions {
    pub fn from_policy(policy: &IdentityPolicy) -> Result<Self, VerificationError> {
        Ok(Self {
            older_than_enabled: policy.older_than > 0,
            older_than: policy.older_than,
            forbidden_countries_enabled: !policy.forbidden_countries.is_empty(),
            forbidden_countries_list_packed: pack_forbidden_countries(
                policy.forbidden_countries.as_slice(),
            )?,
            ofac_enabled: policy.ofac_enabled,
        })
    }
}

/// The public outputs of an accepted VC-and-disclose proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcAndDiscloseResult {
    pub attestation_id: FieldElement,
    pub scope: FieldElement,
    pub user_identifier: FieldElement,
    pub nullifier: FieldElement,
    pub identity_commitment_root: FieldElement,
    pub revealed_data_packed: [FieldElement; 3],
    pub forbidden_countries_list_packed: FieldElement,
}

/// Proof routing for identity verification.
///
/// Starts without any circuit verifier; every proof fails `NO_VERIFIER_SET`
/// until one is installed.
pub struct VerificationHub {
    registry: Arc<dyn IdentityRegistry>,
    vc_and_disclose_verifier: Option<Arc<dyn CircuitVerifier>>,
    register_verifiers: BTreeMap<u64, Arc<dyn CircuitVerifier>>,
    dsc_verifiers: BTreeMap<u64, Arc<dyn CircuitVerifier>>,
}

impl VerificationHub {
    pub fn new(registry: Arc<dyn IdentityRegistry>) -> Self {
        Self {
            registry,
            vc_and_disclose_verifier: None,
            register_verifiers: BTreeMap::new(),
            dsc_verifiers: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<dyn IdentityRegistry> {
        &self.registry
    }

    pub fn set_registry(&mut self, registry: Arc<dyn IdentityRegistry>) {
        self.registry = registry;
    }

    pub fn set_vc_and_disclose_verifier(&mut self, verifier: Arc<dyn CircuitVerifier>) {
        self.vc_and_disclose_verifier = Some(verifier);
    }

    pub fn set_register_verifier(&mut self, type_id: u64, verifier: Arc<dyn CircuitVerifier>) {
        self.register_verifiers.insert(type_id, verifier);
    }

    pub fn set_dsc_verifier(&mut self, type_id: u64, verifier: Arc<dyn CircuitVerifier>) {
        self.dsc_verifiers.insert(type_id, verifier);
    }

    /// Install several register verifiers; nothing changes on a length mismatch.
    pub fn batch_set_register_verifiers(
        &mut self,
        type_ids: &[u64],
        verifiers: &[Arc<dyn CircuitVerifier>],
    ) -> Result<(), VerificationError> {
        if type_ids.len() != verifiers.len() {
            return Err(VerificationError::LengthMismatch);
        }
        for (id, verifier) in type_ids.iter().zip(verifiers) {
            self.register_verifiers.insert(*id, Arc::clone(verifier));
        }
        Ok(())
    }

    /// Install several DSC verifiers; nothing changes on a length mismatch.
    pub fn batch_set_dsc_verifiers(
        &mut self,
        type_ids: &[u64],
        verifiers: &[Arc<dyn CircuitVerifier>],
    ) -> Result<(), VerificationError> {
        if type_ids.len() != verifiers.len() {
            return Err(VerificationError::LengthMismatch);
        }
        for (id, verifier) in type_ids.iter().zip(verifiers) {
            self.dsc_verifiers.insert(*id, Arc::clone(verifier));
        }
        Ok(())
    }

    pub fn vc_and_disclose_verifier_name(&self) -> Option<&str> {
        self.vc_and_disclose_verifier.as_deref().map(|v| v.name())
    }

    pub fn register_verifier_name(&self, type_id: u64) -> Option<&str> {
        self.register_verifiers.get(&type_id).map(|v| v.name())
    }

    pub fn dsc_verifier_name(&self, type_id: u64) -> Option<&str> {
        self.dsc_verifiers.get(&type_id).map(|v| v.name())
    }

    /// Check a selective-disclosure proof.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// commitment root, proof date, minimum age, forbidden countries, OFAC,
    /// verifier presence, then the proof itself.
    pub fn verify_vc_and_disclose(
        &self,
        options: &VcAndDiscloseOptions,
        proof: &VcAndDiscloseProof,
        now: Timestamp,
    ) -> Result<VcAndDiscloseResult, VerificationError> {
        if !self
            .registry
            .check_identity_commitment_root(&proof.merkle_root())
        {
            return Err(VerificationError::InvalidCommitmentRoot);
        }

        check_current_date(proof.current_date(), now)?;

        let revealed_packed = proof.revealed_data_packed();
        let revealed_bytes = unpack_revealed_data(&revealed_packed);

        if options.older_than_enabled && revealed::older_than(&revealed_bytes)? < options.older_than
        {
            return Err(VerificationError::InvalidOlderThan);
        }

        if options.forbidden_countries_enabled
            && proof.forbidden_countries_list_packed() != options.forbidden_countries_list_packed
        {
            return Err(VerificationError::InvalidForbiddenCountries);
        }

        if options.ofac_enabled {
            if !self.registry.check_ofac_root(&proof.smt_root()) {
                return Err(VerificationError::InvalidOfacRoot);
            }
            if revealed::ofac(&revealed_bytes) != OFAC_PASSED {
                return Err(VerificationError::InvalidOfac);
            }
        }

        let verifier = self
            .vc_and_disclose_verifier
            .as_ref()
            .ok_or(VerificationError::NoVerifierSet)?;
        if !verifier.verify_proof(&proof.a, &proof.b, &proof.c, &proof.pub_signals) {
            return Err(VerificationError::InvalidVcAndDiscloseProof);
        }

        Ok(VcAndDiscloseResult {
            attestation_id: proof.attestation_id(),
            scope: proof.scope(),
            user_identifier: proof.user_identifier(),
            nullifier: proof.nullifier(),
            identity_commitment_root: proof.merkle_root(),
            revealed_data_packed: revealed_packed,
            forbidden_countries_list_packed: proof.forbidden_countries_list_packed(),
        })
    }

    /// Verify a register proof and return the commitment it introduces,
    /// without recording it.
    pub fn check_register_proof(
        &self,
        type_id: u64,
        proof: &RegisterProof,
    ) -> Result<PassportCommitment, VerificationError> {
        let verifier = self
            .register_verifiers
            .get(&type_id)
            .ok_or(VerificationError::NoVerifierSet)?;
        let signals = &proof.pub_signals;
        if !self
            .registry
            .check_dsc_key_commitment_merkle_root(&signals[register::DSC_TREE_ROOT_INDEX])
        {
            return Err(VerificationError::InvalidCommitmentRoot);
        }
        if !verifier.verify_proof(&proof.a, &proof.b, &proof.c, signals) {
            return Err(VerificationError::InvalidRegisterProof);
        }
        Ok(PassportCommitment {
            attestation_id: FieldElement::from_u64(PASSPORT_ATTESTATION_ID),
            nullifier: signals[register::NULLIFIER_INDEX],
            commitment: signals[register::COMMITMENT_INDEX],
        })
    }

    /// Verify a register proof and record the passport commitment.
    pub fn register_passport_commitment(
        &self,
        type_id: u64,
        proof: &RegisterProof,
    ) -> Result<PassportCommitment, VerificationError> {
        let entry = self.check_register_proof(type_id, proof)?;
        self.registry
            .register_commitment(entry.attestation_id, entry.nullifier, entry.commitment)?;
        tracing::info!(type_id, "registered passport commitment");
        Ok(entry)
    }

    /// Verify a DSC proof and return the blinded DSC key commitment,
    /// without recording it.
    pub fn check_dsc_proof(
        &self,
        type_id: u64,
        proof: &DscProof,
    ) -> Result<FieldElement, VerificationError> {
        let verifier = self
            .dsc_verifiers
            .get(&type_id)
            .ok_or(VerificationError::NoVerifierSet)?;
        let signals = &proof.pub_signals;
        if !self.registry.check_csca_root(&signals[dsc::CSCA_ROOT_INDEX]) {
            return Err(VerificationError::InvalidCscaRoot);
        }
        if !verifier.verify_proof(&proof.a, &proof.b, &proof.c, signals) {
            return Err(VerificationError::InvalidDscProof);
        }
        Ok(signals[dsc::BLINDED_DSC_COMMITMENT_INDEX])
    }

    /// Verify a DSC proof and record the DSC key commitment.
    pub fn register_dsc_key_commitment(
        &self,
        type_id: u64,
        proof: &DscProof,
    ) -> Result<FieldElement, VerificationError> {
        let commitment = self.check_dsc_proof(type_id, proof)?;
        self.registry.register_dsc_key_commitment(commitment)?;
        tracing::info!(type_id, "registered DSC key commitment");
        Ok(commitment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::date_signals;
    use crate::proof::vc_and_disclose as layout;
    use crate::revealed::{pack_revealed_data, REVEALED_DATA_BYTES};
    use crate::MemoryRegistry;

    const NOW: u64 = 1_710_460_800 + 3_600;
    const ROOT: u64 = 4242;
    const OFAC_ROOT: u64 = 777;

    struct Fixed(bool);

    impl CircuitVerifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn verify_proof(
            &self,
            _a: &[FieldElement; 2],
            _b: &[[FieldElement; 2]; 2],
            _c: &[FieldElement; 2],
            _pub_signals: &[FieldElement],
        ) -> bool {
            self.0
        }
    }

    fn registry() -> Arc<MemoryRegistry> {
        let registry = MemoryRegistry::new();
        registry.add_identity_commitment_root(FieldElement::from_u64(ROOT));
        registry.set_ofac_root(FieldElement::from_u64(OFAC_ROOT));
        registry.add_dsc_key_commitment_root(FieldElement::from_u64(55));
        registry.set_csca_root(FieldElement::from_u64(66));
        Arc::new(registry)
    }

    fn hub(accept: bool) -> VerificationHub {
        let mut hub = VerificationHub::new(registry());
        hub.set_vc_and_disclose_verifier(Arc::new(Fixed(accept)));
        hub
    }

    fn proof(age: &[u8; 2], ofac: u8) -> VcAndDiscloseProof {
        let mut bytes = [0u8; REVEALED_DATA_BYTES];
        bytes[88..90].copy_from_slice(age);
        bytes[90] = ofac;
        let mut proof = VcAndDiscloseProof::default();
        let packed = pack_revealed_data(&bytes);
        proof.pub_signals[..3].copy_from_slice(&packed);
        proof.pub_signals[layout::NULLIFIER_INDEX] = FieldElement::from_u64(9);
        proof.pub_signals[layout::MERKLE_ROOT_INDEX] = FieldElement::from_u64(ROOT);
        proof.pub_signals[layout::CURRENT_DATE_INDEX..layout::CURRENT_DATE_INDEX + 6]
            .copy_from_slice(&date_signals(Timestamp::new(NOW)));
        proof.pub_signals[layout::SMT_ROOT_INDEX] = FieldElement::from_u64(OFAC_ROOT);
        proof.pub_signals[layout::USER_IDENTIFIER_INDEX] = FieldElement::from_u64(31337);
        proof
    }

    fn options() -> VcAndDiscloseOptions {
        VcAndDiscloseOptions::from_policy(&IdentityPolicy::default()).unwrap()
    }

    #[test]
    fn valid_proof_yields_public_outputs() {
        let result = hub(true)
            .verify_vc_and_disclose(&options(), &proof(b"18", 1), Timestamp::new(NOW))
            .unwrap();
        assert_eq!(result.nullifier, FieldElement::from_u64(9));
        assert_eq!(result.user_identifier, FieldElement::from_u64(31337));
        assert_eq!(result.identity_commitment_root, FieldElement::from_u64(ROOT));
    }

    #[test]
    fn checks_fail_in_order() {
        let hub = hub(false);
        let now = Timestamp::new(NOW);

        let mut bad_root = proof(b"10", 0);
        bad_root.pub_signals[layout::MERKLE_ROOT_INDEX] = FieldElement::from_u64(1);
        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &bad_root, now),
            Err(VerificationError::InvalidCommitmentRoot)
        );

        let later = Timestamp::new(NOW + 3 * 86_400);
        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &proof(b"10", 0), later),
            Err(VerificationError::CurrentDateNotInValidRange)
        );

        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &proof(b"17", 0), now),
            Err(VerificationError::InvalidOlderThan)
        );

        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &proof(b"21", 0), now),
            Err(VerificationError::InvalidOfac)
        );

        let mut bad_smt = proof(b"21", 1);
        bad_smt.pub_signals[layout::SMT_ROOT_INDEX] = FieldElement::ZERO;
        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &bad_smt, now),
            Err(VerificationError::InvalidOfacRoot)
        );

        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &proof(b"21", 1), now),
            Err(VerificationError::InvalidVcAndDiscloseProof)
        );
    }

    #[test]
    fn forbidden_countries_must_match_policy() {
        let policy = IdentityPolicy {
            forbidden_countries: vec!["PRK".into()],
            ..IdentityPolicy::default()
        };
        let options = VcAndDiscloseOptions::from_policy(&policy).unwrap();
        let mut p = proof(b"30", 1);
        assert_eq!(
            hub(true).verify_vc_and_disclose(&options, &p, Timestamp::new(NOW)),
            Err(VerificationError::InvalidForbiddenCountries)
        );
        p.pub_signals[layout::FORBIDDEN_COUNTRIES_LIST_PACKED_INDEX] =
            options.forbidden_countries_list_packed;
        assert!(hub(true)
            .verify_vc_and_disclose(&options, &p, Timestamp::new(NOW))
            .is_ok());
    }

    #[test]
    fn no_verifier_set() {
        let hub = VerificationHub::new(registry());
        assert_eq!(
            hub.verify_vc_and_disclose(&options(), &proof(b"30", 1), Timestamp::new(NOW)),
            Err(VerificationError::NoVerifierSet)
        );
        assert_eq!(
            hub.register_passport_commitment(1, &RegisterProof::default()),
            Err(VerificationError::NoVerifierSet)
        );
    }

    #[test]
    fn disabled_checks_are_skipped() {
        let options = VcAndDiscloseOptions::default();
        assert!(hub(true)
            .verify_vc_and_disclose(&options, &proof(b"\0\0", 0), Timestamp::new(NOW))
            .is_ok());
    }

    #[test]
    fn register_passport_commitment_flow() {
        let registry = registry();
        let mut hub = VerificationHub::new(registry.clone());
        hub.set_register_verifier(3, Arc::new(Fixed(true)));

        let mut proof = RegisterProof::default();
        assert_eq!(
            hub.register_passport_commitment(3, &proof),
            Err(VerificationError::InvalidCommitmentRoot)
        );
        proof.pub_signals[register::DSC_TREE_ROOT_INDEX] = FieldElement::from_u64(55);
        proof.pub_signals[register::NULLIFIER_INDEX] = FieldElement::from_u64(1);
        hub.register_passport_commitment(3, &proof).unwrap();
        assert_eq!(registry.commitment_count(), 1);
        assert_eq!(
            hub.register_passport_commitment(3, &proof),
            Err(VerificationError::RegisteredCommitment)
        );

        hub.set_register_verifier(3, Arc::new(Fixed(false)));
        proof.pub_signals[register::NULLIFIER_INDEX] = FieldElement::from_u64(2);
        assert_eq!(
            hub.register_passport_commitment(3, &proof),
            Err(VerificationError::InvalidRegisterProof)
        );
    }

    #[test]
    fn checking_a_register_proof_records_nothing() {
        let registry = registry();
        let mut hub = VerificationHub::new(registry.clone());
        hub.set_register_verifier(3, Arc::new(Fixed(true)));

        let mut proof = RegisterProof::default();
        proof.pub_signals[register::DSC_TREE_ROOT_INDEX] = FieldElement::from_u64(55);
        proof.pub_signals[register::NULLIFIER_INDEX] = FieldElement::from_u64(8);
        proof.pub_signals[register::COMMITMENT_INDEX] = FieldElement::from_u64(9);
        let entry = hub.check_register_proof(3, &proof).unwrap();
        assert_eq!(entry.nullifier, FieldElement::from_u64(8));
        assert_eq!(entry.commitment, FieldElement::from_u64(9));
        assert_eq!(entry.attestation_id, FieldElement::from_u64(PASSPORT_ATTESTATION_ID));
        assert_eq!(registry.commitment_count(), 0);
    }

    #[test]
    fn register_dsc_key_commitment_flow() {
        let registry = registry();
        let mut hub = VerificationHub::new(registry.clone());
        hub.set_dsc_verifier(1, Arc::new(Fixed(true)));

        let mut proof = DscProof::default();
        assert_eq!(
            hub.register_dsc_key_commitment(1, &proof),
            Err(VerificationError::InvalidCscaRoot)
        );
        proof.pub_signals[dsc::CSCA_ROOT_INDEX] = FieldElement::from_u64(66);
        proof.pub_signals[dsc::BLINDED_DSC_COMMITMENT_INDEX] = FieldElement::from_u64(5);
        hub.register_dsc_key_commitment(1, &proof).unwrap();
        assert!(registry.is_dsc_key_commitment_registered(&FieldElement::from_u64(5)));
    }

    #[test]
    fn batch_update_checks_lengths() {
        let mut hub = VerificationHub::new(registry());
        let verifiers: Vec<Arc<dyn CircuitVerifier>> = vec![Arc::new(Fixed(true))];
        assert_eq!(
            hub.batch_set_register_verifiers(&[1, 2], &verifiers),
            Err(VerificationError::LengthMismatch)
        );
        assert_eq!(hub.register_verifier_name(1), None);
        hub.batch_set_dsc_verifiers(&[4], &verifiers).unwrap();
        assert_eq!(hub.dsc_verifier_name(4), Some("fixed"));
    }
}
