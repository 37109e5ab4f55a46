//! RPC request handlers.
//!
//! Writes carry the sending account as `from`; amounts are decimal wei
//! strings.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stakepgp_ledger::KeyStatus;
use stakepgp_utils::format_duration;
use stakepgp_types::{
    Address, FeeDisposition, FieldElement, PassportCommitment, StakeView, Timestamp, Wei,
};
use stakepgp_verification::{
    readable_forbidden_countries, readable_revealed_data, DscProof, Groth16Verifier,
    MemoryRegistry, ReadableRevealedData, RegisterProof, RegistryRoots, VcAndDiscloseProof,
};

use crate::error::RpcError;
use crate::server::RpcState;

fn parse_address(raw: &str) -> Result<Address, RpcError> {
    Address::parse(raw).map_err(|e| RpcError::InvalidRequest(format!("{raw}: {e}")))
}

// ── Constants ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantsResponse {
    pub minimum_stake: Wei,
    pub challenge_fee: Wei,
    pub challenge_duration: u64,
    pub minimum_stake_duration: u64,
    pub fee_disposition: FeeDisposition,
    pub older_than: u32,
    pub ofac_enabled: bool,
    pub forbidden_countries: Vec<String>,
}

pub async fn constants(State(state): State<RpcState>) -> Json<ConstantsResponse> {
    let ledger = state.ledger.lock().await;
    let params = ledger.constants();
    let policy = ledger.identity_policy();
    Json(ConstantsResponse {
        minimum_stake: params.minimum_stake,
        challenge_fee: params.challenge_fee,
        challenge_duration: params.challenge_duration_secs,
        minimum_stake_duration: params.minimum_stake_duration_secs,
        fee_disposition: params.fee_disposition,
        older_than: policy.older_than,
        ofac_enabled: policy.ofac_enabled,
        forbidden_countries: policy.forbidden_countries.clone(),
    })
}

pub async fn stats(State(state): State<RpcState>) -> Json<BTreeMap<&'static str, u64>> {
    Json(state.stats.snapshot())
}

// ── Reads ────────────────────────────────────────────────────────────────

pub async fn stake_of(
    State(state): State<RpcState>,
    Path(address): Path<String>,
) -> Result<Json<StakeView>, RpcError> {
    let address = parse_address(&address)?;
    debug!(%address, "stakes");
    Ok(Json(state.ledger.lock().await.stakes(&address)?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResponse {
    pub remaining_secs: u64,
    /// `remaining_secs` as e.g. "29d 23h".
    pub remaining: String,
}

pub async fn remaining_lock(
    State(state): State<RpcState>,
    Path(address): Path<String>,
) -> Result<Json<LockResponse>, RpcError> {
    let address = parse_address(&address)?;
    let remaining_secs = state.ledger.lock().await.remaining_lock_time(&address)?;
    Ok(Json(LockResponse {
        remaining_secs,
        remaining: format_duration(remaining_secs),
    }))
}

pub async fn key_status(
    State(state): State<RpcState>,
    Path(key_id): Path<String>,
) -> Result<Json<KeyStatus>, RpcError> {
    debug!(%key_id, "key lookup");
    Ok(Json(state.ledger.lock().await.key_status(&key_id)?))
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: Wei,
}

pub async fn balance_of(
    State(state): State<RpcState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, RpcError> {
    let address = parse_address(&address)?;
    let balance = state.ledger.lock().await.balance_of(&address)?;
    Ok(Json(BalanceResponse { balance }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub owner: Address,
    pub pending_owner: Address,
}

pub async fn owner(State(state): State<RpcState>) -> Json<OwnerResponse> {
    let ledger = state.ledger.lock().await;
    Json(OwnerResponse {
        owner: ledger.owner(),
        pending_owner: ledger.pending_owner(),
    })
}

// ── Disclosure decoding ──────────────────────────────────────────────────

pub async fn forbidden_countries(Path(packed): Path<String>) -> Result<Json<Vec<String>>, RpcError> {
    let packed = FieldElement::parse(&packed)?;
    Ok(Json(readable_forbidden_countries(&packed).to_vec()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedDataRequest {
    pub revealed_data_packed: [FieldElement; 3],
    pub types: Vec<u8>,
}

pub async fn revealed_data(
    Json(req): Json<RevealedDataRequest>,
) -> Result<Json<ReadableRevealedData>, RpcError> {
    Ok(Json(readable_revealed_data(&req.revealed_data_packed, &req.types)?))
}

// ── Stake lifecycle ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRequest {
    pub from: Address,
    pub value: Wei,
    /// Armored public key or hex fingerprint.
    pub public_key: String,
}

pub async fn stake(
    State(state): State<RpcState>,
    Json(req): Json<StakeRequest>,
) -> Result<Json<StakeView>, RpcError> {
    let result = state
        .ledger
        .lock()
        .await
        .stake(req.from, req.value, &req.public_key);
    Ok(Json(state.finish("stake", result)?))
}

#[derive(Deserialize)]
pub struct ChallengeRequest {
    pub from: Address,
    pub value: Wei,
    pub staker: Address,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub deadline: Timestamp,
}

pub async fn challenge(
    State(state): State<RpcState>,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, RpcError> {
    let result = state
        .ledger
        .lock()
        .await
        .challenge(req.from, req.value, req.staker);
    let deadline = state.finish("challenge", result)?;
    Ok(Json(ChallengeResponse { deadline }))
}

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub from: Address,
    pub staker: Address,
}

#[derive(Serialize)]
pub struct AmountResponse {
    pub amount: Wei,
}

pub async fn claim(
    State(state): State<RpcState>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<AmountResponse>, RpcError> {
    let result = state.ledger.lock().await.claim_stake(req.from, req.staker);
    let amount = state.finish("claim", result)?;
    Ok(Json(AmountResponse { amount }))
}

#[derive(Deserialize)]
pub struct FromRequest {
    pub from: Address,
}

pub async fn withdraw(
    State(state): State<RpcState>,
    Json(req): Json<FromRequest>,
) -> Result<Json<AmountResponse>, RpcError> {
    let result = state.ledger.lock().await.withdraw_stake(req.from);
    let amount = state.finish("withdraw", result)?;
    Ok(Json(AmountResponse { amount }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendLockRequest {
    pub from: Address,
    pub additional_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendLockResponse {
    pub unlock_time: Timestamp,
}

pub async fn extend_lock(
    State(state): State<RpcState>,
    Json(req): Json<ExtendLockRequest>,
) -> Result<Json<ExtendLockResponse>, RpcError> {
    let result = state
        .ledger
        .lock()
        .await
        .extend_lock(req.from, req.additional_secs);
    let unlock_time = state.finish("extend_lock", result)?;
    Ok(Json(ExtendLockResponse { unlock_time }))
}

#[derive(Deserialize)]
pub struct ProveIdentityRequest {
    pub from: Address,
    pub proof: VcAndDiscloseProof,
}

#[derive(Serialize)]
pub struct ProveIdentityResponse {
    pub verified: bool,
}

pub async fn prove_identity(
    State(state): State<RpcState>,
    Json(req): Json<ProveIdentityRequest>,
) -> Result<Json<ProveIdentityResponse>, RpcError> {
    let result = state
        .ledger
        .lock()
        .await
        .prove_identity(req.from, &req.proof);
    let verified = state.finish("prove_identity", result)?;
    Ok(Json(ProveIdentityResponse { verified }))
}

// ── Commitment registration ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPassportRequest {
    pub type_id: u64,
    pub proof: RegisterProof,
}

pub async fn register_passport(
    State(state): State<RpcState>,
    Json(req): Json<RegisterPassportRequest>,
) -> Result<Json<PassportCommitment>, RpcError> {
    let result = state
        .ledger
        .lock()
        .await
        .register_passport_commitment(req.type_id, &req.proof);
    Ok(Json(state.finish("register", result)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDscRequest {
    pub type_id: u64,
    pub proof: DscProof,
}

#[derive(Serialize)]
pub struct DscCommitmentResponse {
    pub commitment: FieldElement,
}

pub async fn register_dsc(
    State(state): State<RpcState>,
    Json(req): Json<RegisterDscRequest>,
) -> Result<Json<DscCommitmentResponse>, RpcError> {
    let result = state
        .ledger
        .lock()
        .await
        .register_dsc_key_commitment(req.type_id, &req.proof);
    let commitment = state.finish("register", result)?;
    Ok(Json(DscCommitmentResponse { commitment }))
}

// ── Ownership ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOwnershipRequest {
    pub from: Address,
    pub new_owner: Address,
}

pub async fn transfer_ownership(
    State(state): State<RpcState>,
    Json(req): Json<TransferOwnershipRequest>,
) -> Result<Json<OwnerResponse>, RpcError> {
    let mut ledger = state.ledger.lock().await;
    let result = ledger.transfer_ownership(req.from, req.new_owner);
    state.finish("ownership", result)?;
    Ok(Json(OwnerResponse {
        owner: ledger.owner(),
        pending_owner: ledger.pending_owner(),
    }))
}

pub async fn accept_ownership(
    State(state): State<RpcState>,
    Json(req): Json<FromRequest>,
) -> Result<Json<OwnerResponse>, RpcError> {
    let mut ledger = state.ledger.lock().await;
    let result = ledger.accept_ownership(req.from);
    state.finish("ownership", result)?;
    Ok(Json(OwnerResponse {
        owner: ledger.owner(),
        pending_owner: ledger.pending_owner(),
    }))
}

pub async fn renounce_ownership(
    State(state): State<RpcState>,
    Json(req): Json<FromRequest>,
) -> Result<Json<OwnerResponse>, RpcError> {
    let mut ledger = state.ledger.lock().await;
    let result = ledger.renounce_ownership(req.from);
    state.finish("ownership", result)?;
    Ok(Json(OwnerResponse {
        owner: ledger.owner(),
        pending_owner: ledger.pending_owner(),
    }))
}

// ── Admin ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallVerifierRequest {
    pub from: Address,
    /// Required for register and DSC circuits.
    #[serde(default)]
    pub type_id: Option<u64>,
    /// Name reported in events; defaults to the circuit kind.
    #[serde(default)]
    pub name: Option<String>,
    /// A snarkjs `verification_key.json` document.
    pub verifying_key: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallVerifierResponse {
    pub verifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u64>,
}

#[derive(Clone, Copy)]
enum Circuit {
    VcAndDisclose,
    Register,
    Dsc,
}

impl Circuit {
    fn label(self) -> &'static str {
        match self {
            Self::VcAndDisclose => "vc_and_disclose",
            Self::Register => "register",
            Self::Dsc => "dsc",
        }
    }
}

async fn install_verifier(
    state: &RpcState,
    circuit: Circuit,
    req: InstallVerifierRequest,
) -> Result<InstallVerifierResponse, RpcError> {
    let mut ledger = state.ledger.lock().await;
    if let Err(e) = ledger.check_owner(req.from) {
        return Err(state.reject("admin", e));
    }

    let type_id = match (circuit, req.type_id) {
        (Circuit::VcAndDisclose, _) => None,
        (_, Some(type_id)) => Some(type_id),
        (_, None) => {
            return Err(RpcError::InvalidRequest(format!(
                "{} verifier needs a typeId",
                circuit.label()
            )))
        }
    };
    let name = req.name.unwrap_or_else(|| match type_id {
        Some(type_id) => format!("{}-{type_id}", circuit.label()),
        None => circuit.label().to_string(),
    });
    let verifier = Groth16Verifier::from_json_str(name.clone(), &req.verifying_key.to_string())?;
    let verifier = Arc::new(verifier);

    let result = match (circuit, type_id) {
        (Circuit::Register, Some(type_id)) => {
            ledger.update_register_circuit_verifier(req.from, type_id, verifier)
        }
        (Circuit::Dsc, Some(type_id)) => ledger.update_dsc_verifier(req.from, type_id, verifier),
        _ => ledger.update_vc_and_disclose_circuit(req.from, verifier),
    };
    state.finish("admin", result)?;
    Ok(InstallVerifierResponse {
        verifier: name,
        type_id,
    })
}

pub async fn install_vc_and_disclose_verifier(
    State(state): State<RpcState>,
    Json(req): Json<InstallVerifierRequest>,
) -> Result<Json<InstallVerifierResponse>, RpcError> {
    Ok(Json(install_verifier(&state, Circuit::VcAndDisclose, req).await?))
}

pub async fn install_register_verifier(
    State(state): State<RpcState>,
    Json(req): Json<InstallVerifierRequest>,
) -> Result<Json<InstallVerifierResponse>, RpcError> {
    Ok(Json(install_verifier(&state, Circuit::Register, req).await?))
}

pub async fn install_dsc_verifier(
    State(state): State<RpcState>,
    Json(req): Json<InstallVerifierRequest>,
) -> Result<Json<InstallVerifierResponse>, RpcError> {
    Ok(Json(install_verifier(&state, Circuit::Dsc, req).await?))
}

#[derive(Deserialize)]
pub struct UpdateRegistryRequest {
    pub from: Address,
    pub roots: RegistryRoots,
}

/// Replace the identity registry with one accepting `roots`. Registered
/// commitments carry over.
pub async fn update_registry(
    State(state): State<RpcState>,
    Json(req): Json<UpdateRegistryRequest>,
) -> Result<Json<RegistryRoots>, RpcError> {
    let registry = Arc::new(MemoryRegistry::from_roots(&req.roots));
    let result = state
        .ledger
        .lock()
        .await
        .update_registry(req.from, registry);
    state.finish("admin", result)?;
    Ok(Json(req.roots))
}
