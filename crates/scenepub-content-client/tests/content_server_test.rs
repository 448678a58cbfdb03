//! Contract tests for ContentClient against a simulated content server.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/content/available-content` | `available_content_*` |
//! | POST   | `/content/entities` | `deploy_*` |
//! | GET    | `/about` | `connect_*` |
//! | GET    | discovery list | `connect_*` |

use scenepub_content_client::{ContentClient, ContentServerConfig, ContentServerError, DeployRequest};
use scenepub_core::{identifier_of, EntityBuilder, EntityType, ErrorKind, FileRecord, Timestamp};
use scenepub_crypto::{AuthChain, LocalSigner};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

fn test_client(server: &MockServer) -> ContentClient {
    let config = ContentServerConfig::local_mock(&server.uri()).unwrap();
    ContentClient::new(server.uri().parse().unwrap(), &config).unwrap()
}

fn signed_request() -> (DeployRequest, FileRecord) {
    let file = FileRecord::new("main.js", b"console.log(1)".to_vec()).unwrap();
    let entity = EntityBuilder::new(EntityType::Scene)
        .pointers(["0,0"])
        .timestamp(Timestamp::from_millis(1_700_000_000_000))
        .build(std::slice::from_ref(&file))
        .unwrap();
    let signer = LocalSigner::from_hex(KEY).unwrap();
    let signature = signer.sign_message(entity.id().as_str().as_bytes()).unwrap();
    let chain = AuthChain::for_entity(signer.address(), entity.id(), &signature);
    (DeployRequest::new(&entity, chain), file)
}

// ── GET /content/available-content ───────────────────────────────────

#[tokio::test]
async fn available_content_sends_every_cid_and_maps_answers() {
    let server = MockServer::start().await;
    let a = identifier_of(b"a");
    let b = identifier_of(b"b");

    Mock::given(method("GET"))
        .and(path("/content/available-content"))
        .and(query_param("cid", a.as_str()))
        .and(query_param("cid", b.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"cid": a.as_str(), "available": true},
            {"cid": b.as_str(), "available": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let status = test_client(&server)
        .available_content(&[a.clone(), b.clone()])
        .await
        .unwrap();
    assert_eq!(status.len(), 2);
    assert!(status[&a]);
    assert!(!status[&b]);
}

#[tokio::test]
async fn available_content_treats_omitted_cids_as_missing() {
    let server = MockServer::start().await;
    let a = identifier_of(b"a");
    let b = identifier_of(b"b");

    Mock::given(method("GET"))
        .and(path("/content/available-content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"cid": a.as_str(), "available": true}
        ])))
        .mount(&server)
        .await;

    let status = test_client(&server)
        .available_content(&[a.clone(), b.clone()])
        .await
        .unwrap();
    assert!(status[&a]);
    assert!(!status[&b]);
}

#[tokio::test]
async fn available_content_with_no_ids_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let status = test_client(&server).available_content(&[]).await.unwrap();
    assert!(status.is_empty());
}

#[tokio::test]
async fn available_content_rejects_malformed_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/available-content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"cid": "not-a-cid", "available": true}
        ])))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .available_content(&[identifier_of(b"a")])
        .await
        .unwrap_err();
    assert!(matches!(err, ContentServerError::Deserialization { .. }));
    assert_eq!(err.kind(), ErrorKind::ContentServer);
}

#[tokio::test]
async fn available_content_rejects_unrequested_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/available-content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"cid": identifier_of(b"other").as_str(), "available": true}
        ])))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .available_content(&[identifier_of(b"a")])
        .await
        .unwrap_err();
    assert!(matches!(err, ContentServerError::Malformed { .. }));
}

#[tokio::test]
async fn available_content_server_error_is_content_server_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/available-content"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .available_content(&[identifier_of(b"a")])
        .await
        .unwrap_err();
    match &err {
        ContentServerError::Status { status, body, .. } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Status, got: {other:?}"),
    }
    assert!(err.kind().is_retryable());
}

// ── POST /content/entities ───────────────────────────────────────────

#[tokio::test]
async fn deploy_sends_multipart_with_chain_and_files() {
    let server = MockServer::start().await;
    let (request, file) = signed_request();
    let request = request.with_content(file.identifier(), file.content().to_vec());
    let entity_id = request.entity_id().to_string();

    Mock::given(method("POST"))
        .and(path("/content/entities"))
        .and(body_string_contains("name=\"entityId\""))
        .and(body_string_contains(entity_id.as_str()))
        .and(body_string_contains("name=\"authChain[0][type]\""))
        .and(body_string_contains("SIGNER"))
        .and(body_string_contains("name=\"authChain[1][signature]\""))
        .and(body_string_contains("ECDSA_SIGNED_ENTITY"))
        .and(body_string_contains(format!("name=\"{}\"", file.identifier()).as_str()))
        .and(body_string_contains("console.log(1)"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"creationTimestamp": 1_700_000_000_123_i64})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = test_client(&server).deploy(&request).await.unwrap();
    assert_eq!(resp.creation_timestamp, 1_700_000_000_123);
    assert_eq!(request.content_bytes(), 14);
}

#[tokio::test]
async fn deploy_rejection_is_upload_kind() {
    let server = MockServer::start().await;
    let (request, _) = signed_request();

    Mock::given(method("POST"))
        .and(path("/content/entities"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid signature"))
        .mount(&server)
        .await;

    let err = test_client(&server).deploy(&request).await.unwrap_err();
    match &err {
        ContentServerError::UploadRejected { status, body, .. } => {
            assert_eq!(*status, 400);
            assert!(body.contains("invalid signature"));
        }
        other => panic!("expected UploadRejected, got: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Upload);
}

#[tokio::test]
async fn deploy_timeout_is_not_retried() {
    let server = MockServer::start().await;
    let (request, _) = signed_request();

    Mock::given(method("POST"))
        .and(path("/content/entities"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"creationTimestamp": 1}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = ContentServerConfig::local_mock(&server.uri()).unwrap();
    config.timeout_secs = 1;
    let client = ContentClient::new(server.uri().parse().unwrap(), &config).unwrap();

    let err = client.deploy(&request).await.unwrap_err();
    assert!(matches!(err, ContentServerError::UploadFailed { .. }), "got: {err:?}");
    assert_eq!(err.kind(), ErrorKind::Upload);

    let posts = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 1);
}

#[test]
fn deploy_request_ignores_duplicate_content() {
    let (request, file) = signed_request();
    let request = request
        .with_content(file.identifier(), file.content().to_vec())
        .with_content(file.identifier(), file.content().to_vec());
    assert_eq!(request.content().len(), 1);
    assert_eq!(request.files().count(), 2);
    assert_eq!(request.files().last().unwrap().identifier, *request.entity_id());
}

// ── discovery + GET /about ───────────────────────────────────────────

#[tokio::test]
async fn connect_picks_first_healthy_discovered_server() {
    let discovery = MockServer::start().await;
    let unhealthy = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"baseUrl": unhealthy.uri()},
            {"baseUrl": healthy.uri()}
        ])))
        .mount(&discovery)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"healthy": false})))
        .mount(&unhealthy)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"healthy": true, "content": {"version": "6"}})),
        )
        .mount(&healthy)
        .await;

    let mut config = ContentServerConfig::local_mock(&discovery.uri()).unwrap();
    config.target = None;
    let client = ContentClient::connect(&config).await.unwrap();
    assert_eq!(
        client.base_url().as_str().trim_end_matches('/'),
        healthy.uri().trim_end_matches('/')
    );
}

#[tokio::test]
async fn connect_without_healthy_server_fails() {
    let discovery = MockServer::start().await;
    let unhealthy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"baseUrl": unhealthy.uri()}])),
        )
        .mount(&discovery)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&unhealthy)
        .await;

    let mut config = ContentServerConfig::local_mock(&discovery.uri()).unwrap();
    config.target = None;
    let err = ContentClient::connect(&config).await.unwrap_err();
    assert!(matches!(err, ContentServerError::NoHealthyServer { candidates: 1 }));
    assert_eq!(err.kind(), ErrorKind::ContentServer);
}

#[tokio::test]
async fn connect_with_explicit_target_skips_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = ContentServerConfig::local_mock(&server.uri()).unwrap();
    let client = ContentClient::connect(&config).await.unwrap();
    assert_eq!(client.base_url(), config.target.as_ref().unwrap());
}
