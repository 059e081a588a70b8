//! End-to-end tests for the reqwest transport against a mock server.

use std::sync::Arc;
use std::time::Duration;

use deeperseeker_core::prelude::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, config: ClientConfig) -> ChatClient {
    ChatClient::builder()
        .config(config.base_url(server.uri()))
        .credentials(Arc::new(StaticCredential::new("test-api-key")))
        .build()
        .expect("client")
}

fn sse_body(lines: &[&str]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push_str("\n\n");
    }
    body
}

#[tokio::test]
async fn streams_fragments_with_bearer_auth_and_exact_body() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        r#"data: {"id":"1","choices":[{"delta":{"role":"assistant"}}]}"#,
        r#"data: {"id":"1","choices":[{"delta":{"content":"Bonjour"}}]}"#,
        ": keep-alive",
        r#"data: {"id":"1","choices":[{"delta":{"content":" à tous"}}]}"#,
        r#"data: {"id":"1","choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        "data: [DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "model": "sonar-pro",
            "messages": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi"},
                {"role": "user", "content": "translate"}
            ],
            "stream": true,
            "max_tokens": 6000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let history = vec![
        Message::user("hello"),
        Message::assistant("hi"),
        Message::assistant("   "),
        Message::user("translate"),
    ];
    let mut fragments = Vec::new();
    let summary = client
        .send_message(&history, &ModelId::new("sonar-pro"), |f| fragments.push(f))
        .await
        .expect("send");

    let text: String = fragments.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(text, "Bonjour à tous");
    assert!(fragments.iter().all(|f| f.reasoning_text.is_none()));
    assert_eq!(summary.fragments, 2);
    assert!(summary.saw_done);
}

#[tokio::test]
async fn body_without_sentinel_still_completes() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {{\"choices\":[{{\"delta\":{{\"content\":\"cut",
        sse_body(&[r#"data: {"choices":[{"delta":{"content":"whole"}}]}"#])
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let text = client
        .start_stream(vec![Message::user("hi")], ModelId::new("sonar"))
        .await
        .expect("start")
        .collect_text()
        .await
        .expect("collect");
    assert_eq!(text, "whole");
}

#[tokio::test]
async fn malformed_frame_is_counted_and_skipped() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        r#"data: {"choices":[{"delta":{"content":"a"}}]}"#,
        r#"data: {"choices":[{"delta":"#,
        r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
        "data: [DONE]",
    ]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let mut text = String::new();
    let summary = client
        .send_message(&[Message::user("hi")], &ModelId::new("sonar"), |f| {
            text.push_str(&f.text)
        })
        .await
        .expect("send");
    assert_eq!(text, "ab");
    assert_eq!(summary.malformed_frames, 1);
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let mut count = 0;
    let err = client
        .send_message(&[Message::user("hi")], &ModelId::new("sonar"), |_| {
            count += 1
        })
        .await
        .expect_err("should fail");
    assert_eq!(
        err,
        ChatError::HttpStatus {
            status: 401,
            body: "invalid api key".into()
        }
    );
    assert_eq!(count, 0);
}

#[tokio::test]
async fn no_content_response_is_empty_body_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let err = client
        .send_message(&[Message::user("hi")], &ModelId::new("sonar"), |_| {})
        .await
        .expect_err("should fail");
    assert_eq!(err, ChatError::EmptyBody);
}

#[tokio::test]
async fn slow_server_hits_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: [DONE]\n", "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client_for(
        &server,
        ClientConfig::default().timeout(Duration::from_millis(100)),
    );
    let err = client
        .send_message(&[Message::user("hi")], &ModelId::new("sonar"), |_| {})
        .await
        .expect_err("should time out");
    assert!(matches!(err, ChatError::Transport(_)), "got {err:?}");
}
