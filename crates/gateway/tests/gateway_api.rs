//! HTTP-level tests for [`GatewayApi`] against a mock gateway.
//!
//! Cover request shape (auth headers, multipart, query parameters), the
//! success payloads of all four endpoints, and error classification.

use std::time::Duration;

use assert_matches::assert_matches;
use vidconv_core::status::JobStatus;
use vidconv_core::types::{ArtifactId, BearerToken, Credentials};
use vidconv_gateway::api::{GatewayApi, GatewayApiError};
use vidconv_gateway::config::TimeoutPolicy;
use vidconv_gateway::upload::Upload;
use wiremock::matchers::{basic_auth, bearer_token, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn api_for(server: &MockServer) -> GatewayApi {
    GatewayApi::new(server.uri(), TimeoutPolicy::default())
}

fn token() -> BearerToken {
    BearerToken::new("T1").unwrap()
}

fn id(s: &str) -> ArtifactId {
    ArtifactId::new(s).unwrap()
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Basic credentials are sent and the body comes back as the token, untouched.
#[tokio::test]
async fn login_returns_raw_token_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(basic_auth("admin@test.com", "admin123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("eyJ.T1.sig"))
        .expect(1)
        .mount(&server)
        .await;

    let token = api_for(&server)
        .login(&Credentials::new("admin@test.com", "admin123"))
        .await
        .unwrap();

    assert_eq!(token.expose(), "eyJ.T1.sig");
}

#[tokio::test]
async fn login_rejected_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .login(&Credentials::new("admin@test.com", "wrong"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_matches!(err, GatewayApiError::Rejected { status: 401, ref body } if body == "invalid credentials");
}

#[tokio::test]
async fn login_with_empty_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .login(&Credentials::new("a", "b"))
        .await
        .unwrap_err();

    assert_matches!(err, GatewayApiError::Decode(_));
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// The video goes out as a multipart `file` part with bearer auth.
#[tokio::test]
async fn upload_sends_multipart_and_returns_video_fid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(bearer_token("T1"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"clip.mp4\""))
        .and(body_string_contains("video/mp4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "video_fid": "vid-42" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let upload = Upload::from_bytes("clip.mp4", b"fake-video".to_vec()).unwrap();
    let source = api_for(&server).upload(&token(), upload).await.unwrap();

    assert_eq!(source, id("vid-42"));
}

#[tokio::test]
async fn upload_without_video_fid_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("success!"))
        .mount(&server)
        .await;

    let upload = Upload::from_bytes("clip.mp4", b"x".to_vec()).unwrap();
    let err = api_for(&server).upload(&token(), upload).await.unwrap_err();

    assert_matches!(err, GatewayApiError::Decode(_));
}

#[tokio::test]
async fn upload_server_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal server error"))
        .mount(&server)
        .await;

    let upload = Upload::from_bytes("clip.mov", b"x".to_vec()).unwrap();
    let err = api_for(&server).upload(&token(), upload).await.unwrap_err();

    assert_matches!(err, GatewayApiError::Rejected { status: 500, .. });
    assert!(!err.is_unauthorized());
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_completed_with_mp3_fid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .and(query_param("video_fid", "vid-42"))
        .and(bearer_token("T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "status": "completed", "mp3_fid": "mp3-7" }),
        ))
        .mount(&server)
        .await;

    let report = api_for(&server).status(&token(), &id("vid-42")).await.unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.result, Some(id("mp3-7")));
}

#[tokio::test]
async fn status_in_progress_without_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "processing" })),
        )
        .mount(&server)
        .await;

    let report = api_for(&server).status(&token(), &id("vid-42")).await.unwrap();

    assert_eq!(report.status, JobStatus::InProgress);
    assert!(report.result.is_none());
}

#[tokio::test]
async fn status_empty_mp3_fid_is_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "status": "completed", "mp3_fid": "" }),
        ))
        .mount(&server)
        .await;

    let report = api_for(&server).status(&token(), &id("vid-42")).await.unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert!(report.result.is_none());
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_returns_raw_bytes() {
    let server = MockServer::start().await;
    let audio = vec![0x49, 0x44, 0x33, 0x04, 0x00];
    Mock::given(method("GET"))
        .and(path("/download"))
        .and(query_param("fid", "mp3-7"))
        .and(bearer_token("T1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
        .mount(&server)
        .await;

    let bytes = api_for(&server).download(&token(), &id("mp3-7")).await.unwrap();

    assert_eq!(bytes, audio);
}

#[tokio::test]
async fn download_not_found_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .download(&token(), &id("missing"))
        .await
        .unwrap_err();

    assert_matches!(err, GatewayApiError::Rejected { status: 404, ref body } if body == "not found");
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let api = GatewayApi::new("http://127.0.0.1:1", TimeoutPolicy::default());

    let err = api
        .login(&Credentials::new("admin@test.com", "admin123"))
        .await
        .unwrap_err();

    assert_matches!(err, GatewayApiError::Transport(_));
}

#[tokio::test]
async fn slow_status_hits_its_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "processing" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let timeouts = TimeoutPolicy {
        status: Duration::from_millis(100),
        ..TimeoutPolicy::default()
    };
    let api = GatewayApi::new(server.uri(), timeouts);

    let err = api.status(&token(), &id("vid-42")).await.unwrap_err();

    assert_matches!(err, GatewayApiError::Transport(_));
}

/// The client holds no per-call state and can be reused freely.
#[tokio::test]
async fn client_is_reusable_across_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "queued" })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let api = api_for(&server);
    for _ in 0..3 {
        let report = api.status(&token(), &id("vid-1")).await.unwrap();
        assert_eq!(report.status, JobStatus::Submitted);
    }
}
