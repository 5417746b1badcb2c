use course_sdk::*;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm(server: &MockServer) -> LlmClient {
    LlmClient::new(LlmConfig::new("sk-test").with_api_base(server.uri())).unwrap()
}

// ===== Chat Tests =====

#[tokio::test]
async fn test_complete_sends_system_and_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "Zamień dane osobowe na CENZURA."},
                {"role": "user", "content": "Jan Nowak, lat 45"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": " CENZURA, lat CENZURA \n"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = llm(&server)
        .complete(
            "Zamień dane osobowe na CENZURA.",
            "Jan Nowak, lat 45",
            ChatOptions::deterministic(),
        )
        .await
        .unwrap();

    assert_eq!(reply, "CENZURA, lat CENZURA");
}

#[tokio::test]
async fn test_empty_choices_is_llm_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = llm(&server)
        .complete("", "hej", ChatOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::LlmError(_)));
}

#[tokio::test]
async fn test_api_error_message_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = llm(&server)
        .complete("", "hej", ChatOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::AuthenticationError(ref m) if m.contains("Incorrect API key")));
}

// ===== Vision and Audio Tests =====

#[tokio::test]
async fn test_describe_images_inlines_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "Jakie to miasto?"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBO", "detail": "high"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Grudziądz"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("fragment.png");
    std::fs::write(&image, [0x89, 0x50, 0x4e]).unwrap();

    let reply = llm(&server)
        .describe_images("Jakie to miasto?", &[image], "high", ChatOptions::default())
        .await
        .unwrap();
    assert_eq!(reply, "Grudziądz");
}

#[tokio::test]
async fn test_transcribe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(bearer_token("sk-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"text": "Profesor pracował na Łojasiewicza."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = llm(&server)
        .transcribe("adam.m4a", vec![1, 2, 3])
        .await
        .unwrap();
    assert_eq!(text, "Profesor pracował na Łojasiewicza.");
}
