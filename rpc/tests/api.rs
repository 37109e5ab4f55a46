//! Request/response behavior of the HTTP API over nullable infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use stakepgp_ledger::StakeLedger;
use stakepgp_nullables::{
    Groth16Fixture, NullClock, NullRegistry, NullStore, NullVerifier, ProofBuilder,
};
use stakepgp_rpc::{router, RpcState};
use stakepgp_types::{Address, Clock, FieldElement, IdentityPolicy, StakeParams};
use stakepgp_verification::VerificationHub;

const START: u64 = 1_710_460_800 + 12 * 3600;
const DAY: u64 = 86_400;

fn addr(b: u8) -> Address {
    Address::new([b; 20])
}

struct Api {
    app: Router,
    state: RpcState,
    clock: Arc<NullClock>,
}

fn api() -> Api {
    let clock = Arc::new(NullClock::new(START));
    let mut hub = VerificationHub::new(Arc::new(NullRegistry::default()));
    hub.set_vc_and_disclose_verifier(Arc::new(NullVerifier::accepting()));
    hub.set_register_verifier(1, Arc::new(NullVerifier::accepting()));
    hub.set_dsc_verifier(2, Arc::new(NullVerifier::accepting()));
    let ledger = StakeLedger::new(
        Arc::new(NullStore::new()),
        clock.clone(),
        hub,
        addr(0xEE),
        StakeParams::default(),
        IdentityPolicy::default(),
    )
    .unwrap();
    let state = RpcState::new(Arc::new(Mutex::new(ledger)));
    Api {
        app: router(state.clone()),
        state,
        clock,
    }
}

impl Api {
    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call("GET", uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call("POST", uri, Some(body)).await
    }
}

#[tokio::test]
async fn constants_report_defaults() {
    let api = api();
    let (status, body) = api.get("/constants").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["minimumStake"], "100000000000000000");
    assert_eq!(body["challengeFee"], "50000000000000000");
    assert_eq!(body["challengeDuration"], 7 * DAY);
    assert_eq!(body["minimumStakeDuration"], 30 * DAY);
}

#[tokio::test]
async fn stake_challenge_and_prove_over_http() {
    let api = api();
    let (a, b) = (addr(0xA1), addr(0xB2));

    let (status, view) = api
        .post(
            "/stake",
            json!({"from": a, "value": "200000000000000000", "publicKey": "abcd 1234"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["isStaked"], true);
    assert_eq!(view["stakedAmount"], "200000000000000000");

    let (_, key) = api.get("/keys/ABCD1234").await;
    assert_eq!(key["staker"], json!(a));
    assert_eq!(key["challengeable"], true);

    let (status, challenge) = api
        .post(
            "/challenge",
            json!({"from": b, "value": "50000000000000000", "staker": a}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(challenge["deadline"], START + 7 * DAY);

    let proof = ProofBuilder::new(a, api.clock.now()).build();
    let (status, result) = api
        .post("/prove-identity", json!({"from": a, "proof": proof}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["verified"], true);

    let (status, err) = api.post("/claim", json!({"from": b, "staker": a})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "NotChallenged");
    assert!(err["message"].as_str().is_some());

    assert_eq!(api.state.stats.get("stake"), 1);
    assert_eq!(api.state.stats.get("rejected"), 1);
}

#[tokio::test]
async fn unanswered_challenge_is_claimed() {
    let api = api();
    let (a, b) = (addr(0xA1), addr(0xB2));
    api.post(
        "/stake",
        json!({"from": a, "value": "200000000000000000", "publicKey": "ABCD1234"}),
    )
    .await;
    api.post(
        "/challenge",
        json!({"from": b, "value": "50000000000000000", "staker": a}),
    )
    .await;

    let (_, err) = api.post("/claim", json!({"from": b, "staker": a})).await;
    assert_eq!(err["error"], "ChallengePending");

    api.clock.advance(7 * DAY);
    let (status, claimed) = api.post("/claim", json!({"from": b, "staker": a})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["amount"], "250000000000000000");

    let (_, balance) = api.get(&format!("/balances/{b}")).await;
    assert_eq!(balance["balance"], "250000000000000000");
    let (_, view) = api.get(&format!("/stakes/{a}")).await;
    assert_eq!(view["isStaked"], false);
}

#[tokio::test]
async fn withdraw_respects_lock() {
    let api = api();
    let a = addr(0xA1);
    api.post(
        "/stake",
        json!({"from": a, "value": "100000000000000000", "publicKey": "ABCD1234"}),
    )
    .await;

    let (_, lock) = api.get(&format!("/stakes/{a}/lock")).await;
    assert_eq!(lock["remainingSecs"], 30 * DAY);
    assert_eq!(lock["remaining"], "30d 0h");

    let (status, err) = api.post("/withdraw", json!({"from": a})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "StakeLocked");

    let (_, extended) = api
        .post("/extend-lock", json!({"from": a, "additionalSecs": DAY}))
        .await;
    assert_eq!(extended["unlockTime"], START + 31 * DAY);

    let (status, err) = api
        .post("/extend-lock", json!({"from": a, "additionalSecs": 0}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "InvalidExtension");

    api.clock.advance(31 * DAY);
    let (status, withdrawn) = api.post("/withdraw", json!({"from": a})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(withdrawn["amount"], "100000000000000000");
}

#[tokio::test]
async fn ownership_is_two_step() {
    let api = api();
    let (owner, next) = (addr(0xEE), addr(0x0C));

    let (status, err) = api
        .post("/ownership/transfer", json!({"from": next, "newOwner": next}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "OwnableUnauthorizedAccount");

    let (_, pending) = api
        .post("/ownership/transfer", json!({"from": owner, "newOwner": next}))
        .await;
    assert_eq!(pending["pendingOwner"], json!(next));

    let (_, accepted) = api.post("/ownership/accept", json!({"from": next})).await;
    assert_eq!(accepted["owner"], json!(next));
    let (_, current) = api.get("/owner").await;
    assert_eq!(current["owner"], json!(next));
}

#[tokio::test]
async fn decodes_forbidden_countries_and_revealed_data() {
    let api = api();
    let packed = stakepgp_verification::pack_forbidden_countries(&["PRK", "IRN"]).unwrap();
    let (status, codes) = api.get(&format!("/forbidden-countries/{packed}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(codes[0], "PRK");
    assert_eq!(codes[1], "IRN");
    assert_eq!(codes.as_array().unwrap().len(), 10);

    let proof = ProofBuilder::new(addr(0xA1), api.clock.now()).age(21).build();
    let (status, data) = api
        .post(
            "/revealed-data",
            json!({"revealedDataPacked": proof.revealed_data_packed(), "types": [7, 8]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["olderThan"], 21);
    assert_eq!(data["ofac"], 1);

    let (status, err) = api
        .post(
            "/revealed-data",
            json!({"revealedDataPacked": proof.revealed_data_packed(), "types": [9]}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "INVALID_REVEALED_DATA_TYPE");
}

#[tokio::test]
async fn commitments_register_once() {
    let api = api();
    let proof = json!({
        "a": ["0", "0"],
        "b": [["0", "0"], ["0", "0"]],
        "c": ["0", "0"],
        "pubSignals": ["9", "10", "55"],
    });
    let (status, entry) = api
        .post("/register/passport", json!({"typeId": 1, "proof": proof}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["nullifier"], json!(FieldElement::from_u64(9)));
    assert_eq!(entry["commitment"], json!(FieldElement::from_u64(10)));

    let (status, err) = api
        .post("/register/passport", json!({"typeId": 1, "proof": proof}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "REGISTERED_COMMITMENT");

    let dsc = json!({
        "a": ["0", "0"],
        "b": [["0", "0"], ["0", "0"]],
        "c": ["0", "0"],
        "pubSignals": ["5", "66"],
    });
    let (status, err) = api
        .post("/register/dsc", json!({"typeId": 3, "proof": dsc}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "NO_VERIFIER_SET");
    let (status, registered) = api
        .post("/register/dsc", json!({"typeId": 2, "proof": dsc}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["commitment"], json!(FieldElement::from_u64(5)));
    assert_eq!(api.state.stats.get("register"), 2);
}

impl Api {
    /// Stake 0.2 ETH for `a` and have `b` challenge it.
    async fn challenged(&self, a: Address, b: Address) {
        self.post(
            "/stake",
            json!({"from": a, "value": "200000000000000000", "publicKey": "ABCD1234"}),
        )
        .await;
        let (status, _) = self
            .post(
                "/challenge",
                json!({"from": b, "value": "50000000000000000", "staker": a}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn owner_installs_a_groth16_verifier() {
    let api = api();
    let (owner, a, b) = (addr(0xEE), addr(0xA1), addr(0xB2));
    let fixture = Groth16Fixture::new(16);
    let key: Value = serde_json::from_str(&fixture.verifying_key_json()).unwrap();

    let (status, err) = api
        .post(
            "/admin/verifiers/vc-and-disclose",
            json!({"from": a, "verifyingKey": key}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "OwnableUnauthorizedAccount");

    let (status, err) = api
        .post(
            "/admin/verifiers/vc-and-disclose",
            json!({"from": owner, "verifyingKey": {"protocol": "groth16"}}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "INVALID_VERIFYING_KEY");

    let (status, err) = api
        .post(
            "/admin/verifiers/register",
            json!({"from": owner, "verifyingKey": key}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "InvalidRequest");

    let (status, installed) = api
        .post(
            "/admin/verifiers/vc-and-disclose",
            json!({"from": owner, "verifyingKey": key}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(installed["verifier"], "vc_and_disclose");
    assert_eq!(api.state.stats.get("admin"), 1);

    api.challenged(a, b).await;
    let mut proof = ProofBuilder::new(a, api.clock.now()).build();
    let (status, err) = api
        .post("/prove-identity", json!({"from": a, "proof": proof}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "INVALID_VC_AND_DISCLOSE_PROOF");

    (proof.a, proof.b, proof.c) = fixture.prove(&proof.pub_signals);
    let (status, result) = api
        .post("/prove-identity", json!({"from": a, "proof": proof}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["verified"], true);

    let (status, installed) = api
        .post(
            "/admin/verifiers/dsc",
            json!({"from": owner, "typeId": 4, "verifyingKey": key}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(installed["verifier"], "dsc-4");
    assert_eq!(installed["typeId"], 4);
}

#[tokio::test]
async fn owner_replaces_registry_roots() {
    let api = api();
    let (owner, a, b) = (addr(0xEE), addr(0xA1), addr(0xB2));
    let roots = json!({"identity_commitment_roots": ["7"], "ofac_root": "0"});

    let (status, _) = api
        .post("/admin/registry", json!({"from": a, "roots": roots}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api
        .post("/admin/registry", json!({"from": owner, "roots": roots}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["identity_commitment_roots"][0],
        json!(FieldElement::from_u64(7))
    );

    api.challenged(a, b).await;
    let proof = ProofBuilder::new(a, api.clock.now()).build();
    let (status, err) = api
        .post("/prove-identity", json!({"from": a, "proof": proof}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "INVALID_COMMITMENT_ROOT");
}

#[tokio::test]
async fn malformed_addresses_are_bad_requests() {
    let api = api();
    let (status, err) = api.get("/stakes/not-an-address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "InvalidRequest");
}
