//! Client behavior against an in-process HKP server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use stakepgp_keyserver::{KeyserverClient, KeyserverError};

const FINGERPRINT: &str = "0123456789ABCDEF0123456789ABCDEF01234567";
const ARMORED: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nmQINBGZ\n-----END PGP PUBLIC KEY BLOCK-----\n";

#[derive(Clone, Default)]
struct Keyserver {
    uploads: Arc<Mutex<Vec<String>>>,
}

async fn lookup(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let search = params.get("search").map(String::as_str).unwrap_or("");
    if search != format!("0x{FINGERPRINT}") {
        return (StatusCode::NOT_FOUND, "No results found".into());
    }
    match params.get("op").map(String::as_str) {
        Some("get") => {
            let accept = headers
                .get("accept")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            assert_eq!(accept, "application/pgp-keys");
            assert_eq!(params.get("options").map(String::as_str), Some("mr"));
            (StatusCode::OK, ARMORED.into())
        }
        Some("index") => (
            StatusCode::OK,
            format!("info:1:1\npub:{FINGERPRINT}:1:4096:1700000000::\nuid:Alice %3Calice@example.org%3E:1700000000::\n"),
        ),
        _ => (StatusCode::BAD_REQUEST, "unsupported op".into()),
    }
}

async fn add(
    State(server): State<Keyserver>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    match form.get("keytext") {
        Some(text) => {
            server.uploads.lock().unwrap().push(text.clone());
            StatusCode::OK
        }
        None => StatusCode::BAD_REQUEST,
    }
}

async fn spawn_keyserver() -> (String, Keyserver) {
    let server = Keyserver::default();
    let app = Router::new()
        .route("/pks/lookup", get(lookup))
        .route("/pks/add", post(add))
        .with_state(server.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), server)
}

#[tokio::test]
async fn fetches_armored_key_by_fingerprint() {
    let (url, _) = spawn_keyserver().await;
    let client = KeyserverClient::new(url);
    let armored = client.fetch_key(&FINGERPRINT.to_lowercase()).await.unwrap();
    assert_eq!(armored, ARMORED);
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let (url, _) = spawn_keyserver().await;
    let client = KeyserverClient::new(url);
    let result = client.fetch_key("DEADBEEF").await;
    assert!(matches!(result, Err(KeyserverError::KeyNotFound(id)) if id == "0xDEADBEEF"));
}

#[tokio::test]
async fn index_search_decodes_user_ids() {
    let (url, _) = spawn_keyserver().await;
    let client = KeyserverClient::new(url);

    let entries = client.search_index(FINGERPRINT).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key_id, FINGERPRINT);
    assert_eq!(entries[0].primary_user_id(), Some("Alice <alice@example.org>"));

    assert!(client.search_index("DEADBEEF").await.unwrap().is_empty());
}

#[tokio::test]
async fn publish_posts_keytext_form() {
    let (url, server) = spawn_keyserver().await;
    let client = KeyserverClient::new(url);
    client.publish(ARMORED).await.unwrap();
    assert_eq!(server.uploads.lock().unwrap().as_slice(), &[ARMORED.to_string()]);
}
