// ABOUTME: Wire-level tests for the X client against a mock server
// ABOUTME: Covers media upload, post creation, truncation, and error mapping

use crosspost::config::XCredentials;
use crosspost::media::MediaAsset;
use crosspost::publish::{PublishOutcome, Publisher, XClient};
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_credentials() -> XCredentials {
    XCredentials {
        api_key: "key".into(),
        api_secret: "key_secret".into(),
        access_token: "token".into(),
        access_secret: "token_secret".into(),
    }
}

fn client_for(uri: &str) -> XClient {
    XClient::new(test_credentials())
        .unwrap()
        .with_base_urls(uri.into(), uri.into())
}

fn temp_asset(dir: &tempfile::TempDir, name: &str) -> MediaAsset {
    let path = dir.path().join(name);
    std::fs::write(&path, b"jpeg bytes").unwrap();
    MediaAsset {
        source_url: format!("https://img.example/{}", name),
        path,
        byte_size: 10,
    }
}

#[tokio::test]
async fn test_post_without_media_omits_media_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header_exists("Authorization"))
        .and(body_json(serde_json::json!({ "text": "hello world" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "1445880548472328192", "text": "hello world" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let outcome = tokio::task::spawn_blocking(move || {
        let client = client_for(&uri);
        client.publish("hello world", &[])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        outcome,
        PublishOutcome::Posted {
            post_id: "1445880548472328192".into()
        }
    );
}

#[tokio::test]
async fn test_post_with_media_uploads_then_attaches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "media_id": 710511363345354753_u64,
            "media_id_string": "710511363345354753"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_json(serde_json::json!({
            "text": "look at this",
            "media": { "media_ids": ["710511363345354753"] }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "9001", "text": "look at this" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let outcome = tokio::task::spawn_blocking(move || {
        let temp = tempfile::TempDir::new().unwrap();
        let asset = temp_asset(&temp, "pic.jpg");
        client_for(&uri).publish("look at this", &[asset])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, PublishOutcome::Posted { post_id: "9001".into() });
}

#[tokio::test]
async fn test_failed_upload_is_skipped_not_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("media backend down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The post still goes out, with no media object attached.
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_json(serde_json::json!({ "text": "pic day" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "42", "text": "pic day" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let outcome = tokio::task::spawn_blocking(move || {
        let temp = tempfile::TempDir::new().unwrap();
        let asset = temp_asset(&temp, "broken.jpg");
        client_for(&uri).publish("pic day", &[asset])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, PublishOutcome::Posted { post_id: "42".into() });
}

#[tokio::test]
async fn test_long_text_is_truncated_on_the_wire() {
    let mock_server = MockServer::start().await;

    let long_text = "x".repeat(300);
    let expected = format!("{}...", "x".repeat(277));
    assert_eq!(expected.chars().count(), 280);

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_json(serde_json::json!({ "text": expected })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "7", "text": "truncated" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    tokio::task::spawn_blocking(move || client_for(&uri).publish(&long_text, &[]))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_post_creation_failure_surfaces_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_string("duplicate content"))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = tokio::task::spawn_blocking(move || client_for(&uri).publish("again", &[]))
        .await
        .unwrap();

    match result {
        Err(crosspost::Error::Api { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected API error, got {:?}", other.map(|_| ())),
    }
}
