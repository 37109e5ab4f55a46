//! Node startup, persistence across restarts and shutdown.

use std::sync::Arc;
use std::time::Duration;

use stakepgp_ledger::LedgerError;
use stakepgp_node::{NodeConfig, NodeError, StakeNode, TypedVerifierKey};
use stakepgp_nullables::{Groth16Fixture, NullVerifier, ProofBuilder};
use stakepgp_types::{Address, FieldElement, Timestamp, Wei};
use stakepgp_verification::VerificationError;

fn config(dir: &std::path::Path) -> NodeConfig {
    NodeConfig {
        data_dir: dir.to_path_buf(),
        map_size: 16 << 20,
        enable_rpc: false,
        owner: Some(Address::new([0xEE; 20])),
        ..NodeConfig::default()
    }
}

#[tokio::test]
async fn stakes_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let alice = Address::new([0xA1; 20]);
    {
        let node = StakeNode::new(config(dir.path())).unwrap();
        let ledger = node.ledger();
        let mut ledger = ledger.lock().await;
        ledger.stake(alice, Wei::from_milli_eth(200), "ABCD1234").unwrap();
    }

    let node = StakeNode::new(config(dir.path())).unwrap();
    let ledger = node.ledger();
    let ledger = ledger.lock().await;
    assert!(ledger.stakes(&alice).unwrap().is_staked);
    assert_eq!(ledger.key_id_to_staker("abcd1234").unwrap(), alice);
    assert_eq!(ledger.custody().unwrap(), Wei::from_milli_eth(200));
}

#[tokio::test]
async fn proofs_fail_until_verifier_is_installed() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.registry.identity_commitment_roots = vec![FieldElement::ZERO];
    cfg.registry.ofac_root = Some(FieldElement::ZERO);
    let node = StakeNode::new(cfg).unwrap();
    let (owner, alice, bob) = (
        Address::new([0xEE; 20]),
        Address::new([0xA1; 20]),
        Address::new([0xB2; 20]),
    );

    let ledger = node.ledger();
    let mut ledger = ledger.lock().await;
    ledger.stake(alice, Wei::from_milli_eth(200), "ABCD1234").unwrap();
    ledger.challenge(bob, Wei::from_milli_eth(50), alice).unwrap();

    let proof = ProofBuilder::new(alice, Timestamp::now()).build();
    let err = ledger.prove_identity(alice, &proof).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Verification(VerificationError::NoVerifierSet)
    ));

    ledger
        .update_vc_and_disclose_circuit(owner, Arc::new(NullVerifier::accepting()))
        .unwrap();
    assert!(ledger.prove_identity(alice, &proof).unwrap());
    assert!(ledger.stakes(&alice).unwrap().challenger.is_zero());
}

#[tokio::test]
async fn configured_verifying_key_checks_proofs() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Groth16Fixture::new(16);
    let key_path = dir.path().join("vc_and_disclose.json");
    std::fs::write(&key_path, fixture.verifying_key_json()).unwrap();

    let mut cfg = config(dir.path());
    cfg.registry.identity_commitment_roots = vec![FieldElement::ZERO];
    cfg.registry.ofac_root = Some(FieldElement::ZERO);
    cfg.verifiers.vc_and_disclose = Some(key_path);
    let node = StakeNode::new(cfg).unwrap();
    let (alice, bob) = (Address::new([0xA1; 20]), Address::new([0xB2; 20]));

    let ledger = node.ledger();
    let mut ledger = ledger.lock().await;
    assert_eq!(
        ledger.hub().vc_and_disclose_verifier_name(),
        Some("vc_and_disclose")
    );
    ledger.stake(alice, Wei::from_milli_eth(200), "ABCD1234").unwrap();
    ledger.challenge(bob, Wei::from_milli_eth(50), alice).unwrap();

    let mut proof = ProofBuilder::new(alice, Timestamp::now()).build();
    let err = ledger.prove_identity(alice, &proof).unwrap_err();
    assert_eq!(err.name(), "INVALID_VC_AND_DISCLOSE_PROOF");

    (proof.a, proof.b, proof.c) = fixture.prove(&proof.pub_signals);
    assert!(ledger.prove_identity(alice, &proof).unwrap());
    assert!(ledger.stakes(&alice).unwrap().challenger.is_zero());
}

#[test]
fn unreadable_verifying_key_stops_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.verifiers.register.push(TypedVerifierKey {
        type_id: 1,
        verifying_key: dir.path().join("missing.json"),
    });
    let err = StakeNode::new(cfg).err().unwrap();
    assert!(matches!(
        err,
        NodeError::Verifier(VerificationError::InvalidVerifyingKey(_))
    ));
}

#[test]
fn missing_owner_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.owner = None;
    assert!(matches!(StakeNode::new(cfg), Err(NodeError::Config(_))));
}

#[tokio::test]
async fn run_returns_after_programmatic_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.enable_rpc = true;
    cfg.rpc_port = 0;
    let node = Arc::new(StakeNode::new(cfg).unwrap());

    let runner = Arc::clone(&node);
    let handle = tokio::spawn(async move { runner.run().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    node.shutdown_controller().shutdown();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("node did not stop")
        .unwrap();
    assert!(result.is_ok());
}
