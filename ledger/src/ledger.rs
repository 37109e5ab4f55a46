//! The stake ledger state machine.

use std::sync::Arc;

use serde::Serialize;
use stakepgp_store::{StakeStore, WriteBatch};
use stakepgp_types::{
    Address, Clock, FeeDisposition, FieldElement, IdentityPolicy, KeyId, PassportCommitment,
    StakeParams, StakeRecord, StakeView, Timestamp, Wei,
};
use stakepgp_verification::{
    CircuitVerifier, DscProof, IdentityRegistry, RegisterProof, VcAndDiscloseOptions,
    VcAndDiscloseProof, VcAndDiscloseResult, VerificationError, VerificationHub,
};

use crate::{EventBus, LedgerError, LedgerEvent, Ownership};

/// Who holds a key and whether it can be challenged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    /// The zero address when the key is not staked.
    pub staker: Address,
    pub has_stake: bool,
    pub challengeable: bool,
}

/// Staking, challenges and withdrawals over a [`StakeStore`].
///
/// Methods taking `&mut self` are the write operations; callers serialize
/// them (the RPC server holds the ledger behind one mutex).
pub struct StakeLedger {
    store: Arc<dyn StakeStore>,
    clock: Arc<dyn Clock>,
    params: StakeParams,
    policy: IdentityPolicy,
    disclosure: VcAndDiscloseOptions,
    hub: VerificationHub,
    ownership: Ownership,
    events: EventBus,
}

impl StakeLedger {
    pub fn new(
        store: Arc<dyn StakeStore>,
        clock: Arc<dyn Clock>,
        hub: VerificationHub,
        owner: Address,
        params: StakeParams,
        policy: IdentityPolicy,
    ) -> Result<Self, LedgerError> {
        let disclosure = VcAndDiscloseOptions::from_policy(&policy)?;
        replay_commitments(store.as_ref(), hub.registry().as_ref())?;
        Ok(Self {
            store,
            clock,
            params,
            policy,
            disclosure,
            hub,
            ownership: Ownership::new(owner)?,
            events: EventBus::new(),
        })
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn constants(&self) -> &StakeParams {
        &self.params
    }

    pub fn identity_policy(&self) -> &IdentityPolicy {
        &self.policy
    }

    pub fn hub(&self) -> &VerificationHub {
        &self.hub
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn emit(&self, event: LedgerEvent) {
        self.events.emit(&event);
    }

    fn active_stake(&self, staker: &Address) -> Result<StakeRecord, LedgerError> {
        match self.store.get_stake(staker)? {
            Some(record) if record.is_staked => Ok(record),
            _ => Err(LedgerError::NoActiveStake),
        }
    }

    fn credit(&self, batch: &mut WriteBatch, account: Address, amount: Wei) -> Result<(), LedgerError> {
        let balance = self
            .store
            .balance(&account)?
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        batch.set_balance(account, balance);
        Ok(())
    }

    fn custody_plus(&self, amount: Wei) -> Result<Wei, LedgerError> {
        self.store
            .custody()?
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    fn custody_minus(&self, amount: Wei) -> Result<Wei, LedgerError> {
        self.store
            .custody()?
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    // ── Stake ledger ────────────────────────────────────────────────────

    /// Stake `value` against a PGP public key or key fingerprint.
    pub fn stake(
        &mut self,
        caller: Address,
        value: Wei,
        public_key: &str,
    ) -> Result<StakeView, LedgerError> {
        let key = KeyId::normalize(public_key).map_err(LedgerError::InvalidPublicKey)?;

        if self.store.get_stake(&caller)?.is_some_and(|r| r.is_staked) {
            return Err(LedgerError::AlreadyStaked);
        }
        if value < self.params.minimum_stake {
            return Err(LedgerError::InsufficientStake {
                required: self.params.minimum_stake,
                provided: value,
            });
        }
        if let Some(holder) = self.store.staker_for_key(&key)? {
            if holder != caller && self.store.get_stake(&holder)?.is_some_and(|r| r.is_staked) {
                return Err(LedgerError::AlreadyStaked);
            }
        }

        let record = StakeRecord::new(public_key.to_string(), key.clone(), value, self.now());
        let view = record.view();
        let mut batch = WriteBatch::new();
        batch
            .put_stake(caller, record)
            .index_key(key.clone(), caller)
            .set_custody(self.custody_plus(value)?);
        self.store.commit(batch)?;

        tracing::info!(staker = %caller, key = %key, amount = %value, "staked");
        self.emit(LedgerEvent::Staked {
            user: caller,
            public_key: public_key.to_string(),
            amount: value,
        });
        Ok(view)
    }

    /// Withdraw an unchallenged, unlocked stake. Returns the amount credited.
    pub fn withdraw_stake(&mut self, caller: Address) -> Result<Wei, LedgerError> {
        let record = self.active_stake(&caller)?;
        if record.is_challenged() {
            return Err(LedgerError::ChallengePending);
        }
        let now = self.now();
        let remaining = record.remaining_lock(&self.params, now);
        if remaining > 0 {
            return Err(LedgerError::StakeLocked {
                remaining_secs: remaining,
            });
        }

        let amount = record.staked_amount;
        let mut batch = WriteBatch::new();
        batch
            .put_stake(caller, StakeRecord::default())
            .set_custody(self.custody_minus(amount)?);
        if let Some(key) = record.key_id {
            batch.unindex_key(key);
        }
        self.credit(&mut batch, caller, amount)?;
        self.store.commit(batch)?;

        tracing::info!(staker = %caller, amount = %amount, "stake withdrawn");
        self.emit(LedgerEvent::StakeWithdrawn {
            user: caller,
            amount,
        });
        Ok(amount)
    }

    /// Push the caller's unlock time further out. Returns the new unlock time.
    pub fn extend_lock(
        &mut self,
        caller: Address,
        additional_secs: u64,
    ) -> Result<Timestamp, LedgerError> {
        let mut record = self.active_stake(&caller)?;
        if additional_secs == 0 {
            return Err(LedgerError::InvalidExtension);
        }
        record.lock_extension = record
            .lock_extension
            .checked_add(additional_secs)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let unlock = record.unlock_time(&self.params);

        let mut batch = WriteBatch::new();
        batch.put_stake(caller, record);
        self.store.commit(batch)?;

        tracing::info!(staker = %caller, unlock = %unlock, "lock extended");
        self.emit(LedgerEvent::LockExtended {
            user: caller,
            new_unlock_time: unlock,
        });
        Ok(unlock)
    }

    /// Seconds until `user` may withdraw; zero when unlocked or not staked.
    pub fn remaining_lock_time(&self, user: &Address) -> Result<u64, LedgerError> {
        Ok(self
            .store
            .get_stake(user)?
            .map(|r| r.remaining_lock(&self.params, self.now()))
            .unwrap_or(0))
    }

    /// The `stakes(address)` read. Unknown addresses read as an empty record.
    pub fn stakes(&self, user: &Address) -> Result<StakeView, LedgerError> {
        Ok(self.store.get_stake(user)?.unwrap_or_default().view())
    }

    pub fn balance_of(&self, account: &Address) -> Result<Wei, LedgerError> {
        Ok(self.store.balance(account)?)
    }

    /// Total value held: active stakes plus pending challenge fees.
    pub fn custody(&self) -> Result<Wei, LedgerError> {
        Ok(self.store.custody()?)
    }

    // ── Challenge state machine ─────────────────────────────────────────

    /// Challenge `staker`'s stake, paying `value` as the fee.
    pub fn challenge(
        &mut self,
        caller: Address,
        value: Wei,
        staker: Address,
    ) -> Result<Timestamp, LedgerError> {
        let mut record = self.active_stake(&staker)?;
        if caller == staker {
            return Err(LedgerError::ChallengeFailed(
                "a staker cannot challenge their own stake".into(),
            ));
        }
        if record.is_challenged() {
            return Err(LedgerError::AlreadyChallenged);
        }
        if value < self.params.challenge_fee {
            return Err(LedgerError::InsufficientChallengeFee {
                required: self.params.challenge_fee,
                provided: value,
            });
        }

        let deadline = self.now().plus(self.params.challenge_duration_secs);
        record.challenger = Some(caller);
        record.challenge_deadline = deadline;
        record.challenge_fee = value;

        let mut batch = WriteBatch::new();
        batch
            .put_stake(staker, record)
            .set_custody(self.custody_plus(value)?);
        self.store.commit(batch)?;

        tracing::info!(staker = %staker, challenger = %caller, deadline = %deadline, "challenged");
        self.emit(LedgerEvent::Challenged {
            user: staker,
            challenger: caller,
        });
        Ok(deadline)
    }

    /// Take an unanswered stake once the challenge deadline has passed.
    /// Returns the amount credited to the challenger (stake plus fee).
    pub fn claim_stake(&mut self, caller: Address, staker: Address) -> Result<Wei, LedgerError> {
        let record = self.active_stake(&staker)?;
        let challenger = record.challenger.ok_or(LedgerError::NotChallenged)?;
        if caller != challenger {
            return Err(LedgerError::NotChallenger);
        }
        if self.now() < record.challenge_deadline {
            return Err(LedgerError::ChallengePending);
        }

        let payout = record
            .staked_amount
            .checked_add(record.challenge_fee)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let mut batch = WriteBatch::new();
        batch
            .put_stake(staker, StakeRecord::default())
            .set_custody(self.custody_minus(payout)?);
        if let Some(key) = record.key_id {
            batch.unindex_key(key);
        }
        self.credit(&mut batch, challenger, payout)?;
        self.store.commit(batch)?;

        tracing::info!(staker = %staker, challenger = %challenger, amount = %payout, "stake claimed");
        self.emit(LedgerEvent::ChallengeResolved {
            user: staker,
            challenger,
            success: false,
        });
        Ok(payout)
    }

    // ── Identity verification gate ──────────────────────────────────────

    /// Answer a pending challenge with a passport proof.
    pub fn prove_identity(
        &mut self,
        caller: Address,
        proof: &VcAndDiscloseProof,
    ) -> Result<bool, LedgerError> {
        let mut record = self.active_stake(&caller)?;
        if !record.is_challenged() {
            return Err(LedgerError::NotChallenged);
        }
        let now = self.now();
        if now >= record.challenge_deadline {
            return Err(LedgerError::ChallengeExpired);
        }

        let result = self.hub.verify_vc_and_disclose(&self.disclosure, proof, now)?;
        self.check_binding(caller, &result)?;

        let (challenger, fee) = record.clear_challenge().ok_or(LedgerError::NotChallenged)?;
        let fee_recipient = match self.params.fee_disposition {
            FeeDisposition::ForfeitToStaker => caller,
            FeeDisposition::RefundToChallenger => challenger,
        };

        let mut batch = WriteBatch::new();
        batch
            .put_stake(caller, record)
            .bind_nullifier(result.nullifier, caller)
            .set_custody(self.custody_minus(fee)?);
        self.credit(&mut batch, fee_recipient, fee)?;
        self.store.commit(batch)?;

        tracing::info!(staker = %caller, challenger = %challenger, "identity proven");
        self.emit(LedgerEvent::ChallengeResolved {
            user: caller,
            challenger,
            success: true,
        });
        Ok(true)
    }

    fn check_binding(&self, caller: Address, result: &VcAndDiscloseResult) -> Result<(), LedgerError> {
        if self.policy.bind_user_identifier && result.user_identifier != FieldElement::from(caller) {
            return Err(LedgerError::ChallengeFailed(
                "proof was generated for a different address".into(),
            ));
        }
        match self.store.nullifier_owner(&result.nullifier)? {
            Some(owner) if owner != caller => Err(LedgerError::ChallengeFailed(
                "passport already backs another stake".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Verify a passport register proof and record its commitment.
    ///
    /// The commitment is persisted before the registry sees it, so a
    /// restarted node replays every commitment it ever accepted.
    pub fn register_passport_commitment(
        &mut self,
        type_id: u64,
        proof: &RegisterProof,
    ) -> Result<PassportCommitment, LedgerError> {
        let entry = self.hub.check_register_proof(type_id, proof)?;
        if self.store.passport_commitment(&entry.nullifier)?.is_some() {
            return Err(VerificationError::RegisteredCommitment.into());
        }

        let mut batch = WriteBatch::new();
        batch.put_passport_commitment(entry);
        self.store.commit(batch)?;
        self.hub
            .registry()
            .register_commitment(entry.attestation_id, entry.nullifier, entry.commitment)?;

        tracing::info!(type_id, nullifier = %entry.nullifier, "passport commitment registered");
        self.emit(LedgerEvent::PassportCommitmentRegistered {
            nullifier: entry.nullifier,
            commitment: entry.commitment,
        });
        Ok(entry)
    }

    /// Verify a DSC proof and record the DSC key commitment.
    pub fn register_dsc_key_commitment(
        &mut self,
        type_id: u64,
        proof: &DscProof,
    ) -> Result<FieldElement, LedgerError> {
        let commitment = self.hub.check_dsc_proof(type_id, proof)?;
        if self.store.has_dsc_key_commitment(&commitment)? {
            return Err(VerificationError::RegisteredCommitment.into());
        }

        let mut batch = WriteBatch::new();
        batch.put_dsc_key_commitment(commitment);
        self.store.commit(batch)?;
        self.hub.registry().register_dsc_key_commitment(commitment)?;

        tracing::info!(type_id, commitment = %commitment, "DSC key commitment registered");
        self.emit(LedgerEvent::DscKeyCommitmentRegistered { commitment });
        Ok(commitment)
    }

    // ── Key registry index ──────────────────────────────────────────────

    /// The staker holding `key`, or the zero address.
    pub fn key_id_to_staker(&self, key: &str) -> Result<Address, LedgerError> {
        let Ok(key) = KeyId::normalize(key) else {
            return Ok(Address::ZERO);
        };
        Ok(self.store.staker_for_key(&key)?.unwrap_or(Address::ZERO))
    }

    pub fn key_status(&self, key: &str) -> Result<KeyStatus, LedgerError> {
        let staker = self.key_id_to_staker(key)?;
        if staker.is_zero() {
            return Ok(KeyStatus {
                staker,
                has_stake: false,
                challengeable: false,
            });
        }
        let record = self.store.get_stake(&staker)?.unwrap_or_default();
        Ok(KeyStatus {
            staker,
            has_stake: record.is_staked,
            challengeable: record.is_challengeable(),
        })
    }

    // ── Ownership and admin ─────────────────────────────────────────────

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.ownership.pending_owner()
    }

    /// Fails with `OwnableUnauthorizedAccount` unless `caller` is the owner.
    pub fn check_owner(&self, caller: Address) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), LedgerError> {
        let (previous_owner, new_owner) = self.ownership.transfer(caller, new_owner)?;
        tracing::info!(owner = %previous_owner, pending = %new_owner, "ownership transfer started");
        self.emit(LedgerEvent::OwnershipTransferStarted {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn accept_ownership(&mut self, caller: Address) -> Result<(), LedgerError> {
        let (previous_owner, new_owner) = self.ownership.accept(caller)?;
        tracing::info!(previous = %previous_owner, owner = %new_owner, "ownership transferred");
        self.emit(LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), LedgerError> {
        let previous_owner = self.ownership.renounce(caller)?;
        tracing::info!(previous = %previous_owner, "ownership renounced");
        self.emit(LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner: Address::ZERO,
        });
        Ok(())
    }

    pub fn update_registry(
        &mut self,
        caller: Address,
        registry: Arc<dyn IdentityRegistry>,
    ) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)?;
        replay_commitments(self.store.as_ref(), registry.as_ref())?;
        self.hub.set_registry(registry);
        self.emit(LedgerEvent::RegistryUpdated);
        Ok(())
    }

    pub fn update_vc_and_disclose_circuit(
        &mut self,
        caller: Address,
        verifier: Arc<dyn CircuitVerifier>,
    ) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)?;
        let name = verifier.name().to_string();
        self.hub.set_vc_and_disclose_verifier(verifier);
        tracing::info!(verifier = %name, "vc-and-disclose verifier updated");
        self.emit(LedgerEvent::VcAndDiscloseCircuitUpdated { verifier: name });
        Ok(())
    }

    pub fn update_register_circuit_verifier(
        &mut self,
        caller: Address,
        type_id: u64,
        verifier: Arc<dyn CircuitVerifier>,
    ) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)?;
        let name = verifier.name().to_string();
        self.hub.set_register_verifier(type_id, verifier);
        self.emit(LedgerEvent::RegisterCircuitVerifierUpdated {
            type_id,
            verifier: name,
        });
        Ok(())
    }

    pub fn update_dsc_verifier(
        &mut self,
        caller: Address,
        type_id: u64,
        verifier: Arc<dyn CircuitVerifier>,
    ) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)?;
        let name = verifier.name().to_string();
        self.hub.set_dsc_verifier(type_id, verifier);
        self.emit(LedgerEvent::DscCircuitVerifierUpdated {
            type_id,
            verifier: name,
        });
        Ok(())
    }

    pub fn batch_update_register_circuit_verifiers(
        &mut self,
        caller: Address,
        type_ids: &[u64],
        verifiers: &[Arc<dyn CircuitVerifier>],
    ) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)?;
        self.hub.batch_set_register_verifiers(type_ids, verifiers)?;
        for (type_id, verifier) in type_ids.iter().zip(verifiers) {
            self.emit(LedgerEvent::RegisterCircuitVerifierUpdated {
                type_id: *type_id,
                verifier: verifier.name().to_string(),
            });
        }
        Ok(())
    }

    pub fn batch_update_dsc_circuit_verifiers(
        &mut self,
        caller: Address,
        type_ids: &[u64],
        verifiers: &[Arc<dyn CircuitVerifier>],
    ) -> Result<(), LedgerError> {
        self.ownership.check_owner(caller)?;
        self.hub.batch_set_dsc_verifiers(type_ids, verifiers)?;
        for (type_id, verifier) in type_ids.iter().zip(verifiers) {
            self.emit(LedgerEvent::DscCircuitVerifierUpdated {
                type_id: *type_id,
                verifier: verifier.name().to_string(),
            });
        }
        Ok(())
    }
}

/// Hand every persisted commitment to `registry`. Entries it already holds
/// are skipped.
fn replay_commitments(
    store: &dyn StakeStore,
    registry: &dyn IdentityRegistry,
) -> Result<(), LedgerError> {
    let passports = store.passport_commitments()?;
    let dscs = store.dsc_key_commitments()?;
    for entry in &passports {
        skip_registered(registry.register_commitment(
            entry.attestation_id,
            entry.nullifier,
            entry.commitment,
        ))?;
    }
    for commitment in &dscs {
        skip_registered(registry.register_dsc_key_commitment(*commitment))?;
    }
    if !passports.is_empty() || !dscs.is_empty() {
        tracing::debug!(
            passports = passports.len(),
            dsc_keys = dscs.len(),
            "replayed commitments into registry"
        );
    }
    Ok(())
}

fn skip_registered(result: Result<(), VerificationError>) -> Result<(), VerificationError> {
    match result {
        Err(VerificationError::RegisteredCommitment) => Ok(()),
        other => other,
    }
}
