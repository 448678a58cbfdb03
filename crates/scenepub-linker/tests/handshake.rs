//! End-to-end signing sessions over real loopback sockets.

use std::time::{Duration, Instant};

use scenepub_core::{identifier_of, EntityType, Pointer};
use scenepub_crypto::LocalSigner;
use scenepub_linker::{LinkPayload, LinkState, Linker, LinkerConfig, LinkerError};

const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

fn payload() -> LinkPayload {
    let pointers = vec![
        Pointer::parse("0,0", EntityType::Scene).unwrap(),
        Pointer::parse("0,1", EntityType::Scene).unwrap(),
    ];
    LinkPayload::for_entity(
        &identifier_of(b"scene entity"),
        &pointers,
        "mainnet",
        "https://peer.example",
    )
}

fn linker(timeout: Duration) -> Linker {
    Linker::new(LinkerConfig::for_tests(timeout))
}

async fn assert_refused(url: &str) {
    let client = reqwest::Client::new();
    let err = client
        .get(format!("{url}api/payload"))
        .send()
        .await
        .expect_err("listener should be closed");
    assert!(err.is_connect(), "expected connect error, got {err}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn payload_is_published() {
    let linker = linker(Duration::from_secs(10));
    let handle = linker.open(payload()).await.unwrap();
    assert_eq!(handle.state(), LinkState::AwaitingResponse);
    assert!(handle.url().starts_with("http://127.0.0.1:"));

    let json: serde_json::Value = reqwest::get(format!("{}api/payload", handle.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["sessionId"], handle.session_id().to_string());
    assert_eq!(json["entityId"], handle.payload().entity_id.as_str());
    assert_eq!(json["pointers"], serde_json::json!(["0,0", "0,1"]));
    handle.cancel();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unanswered_session_times_out_and_closes_listener() {
    let linker = linker(Duration::from_secs(3));
    let started = Instant::now();
    let handle = linker.open(payload()).await.unwrap();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, LinkerError::TimedOut));
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(handle.state(), LinkState::TimedOut);

    assert_refused(handle.url()).await;
    assert!(!linker.is_busy());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_post_keeps_session_open_then_valid_post_signs() {
    let linker = linker(Duration::from_secs(10));
    let handle = linker.open(payload()).await.unwrap();
    let client = reqwest::Client::new();
    let sign_url = format!("{}api/sign", handle.url());

    let bad = client
        .post(&sign_url)
        .json(&serde_json::json!({"address": "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);
    let body: serde_json::Value = bad.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(handle.state(), LinkState::AwaitingResponse);

    let signer = LocalSigner::from_hex(KEY).unwrap();
    let signature = signer
        .sign_message(handle.payload().message.as_bytes())
        .unwrap();
    let ok = client
        .post(&sign_url)
        .json(&serde_json::json!({
            "address": signer.address().to_string(),
            "signature": signature.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);

    let signed = handle.wait().await.unwrap();
    assert_eq!(signed.address, signer.address());
    assert_eq!(signed.signature, signature);
    assert_eq!(signed.chain_id, None);
    assert!(matches!(handle.state(), LinkState::Signed(_)));
    assert_refused(handle.url()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn declined_signature_fails_session() {
    let linker = linker(Duration::from_secs(10));
    let handle = linker.open(payload()).await.unwrap();
    let resp = reqwest::Client::new()
        .post(format!("{}api/sign", handle.url()))
        .json(&serde_json::json!({"error": "User denied message signature"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    match handle.wait().await {
        Err(LinkerError::Rejected(reason)) => assert!(reason.contains("denied")),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_open_while_live_is_rejected() {
    let linker = linker(Duration::from_secs(10));
    let first = linker.open(payload()).await.unwrap();

    let err = linker.open(payload()).await.unwrap_err();
    assert!(matches!(err, LinkerError::SessionInProgress));

    first.cancel();
    assert!(matches!(first.wait().await, Err(LinkerError::Cancelled)));

    let second = linker.open(payload()).await.unwrap();
    assert_ne!(second.session_id(), first.session_id());
    second.cancel();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_closes_listener() {
    let linker = linker(Duration::from_secs(10));
    let handle = linker.open(payload()).await.unwrap();
    let mut states = handle.subscribe();

    handle.cancel();
    states
        .wait_for(LinkState::is_terminal)
        .await
        .unwrap();
    assert_eq!(handle.state(), LinkState::Cancelled);
    assert_refused(handle.url()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_handle_releases_linker() {
    let linker = linker(Duration::from_secs(10));
    let handle = linker.open(payload()).await.unwrap();
    drop(handle);

    let deadline = Instant::now() + Duration::from_secs(3);
    while linker.is_busy() {
        assert!(Instant::now() < deadline, "linker still busy after drop");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    linker.open(payload()).await.unwrap().cancel();
}
