use course_core::{Answer, ApiKey, Grader, Verdict};
use course_sdk::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CourseClient {
    CourseClient::new(SdkConfig::new(server.uri()).with_api_key(ApiKey::new("test-key").unwrap()))
        .unwrap()
}

// ===== Submitter Tests =====

#[tokio::test]
async fn test_submit_posts_full_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .and(body_json(json!({
            "task": "CENZURA",
            "apikey": "test-key",
            "answer": "Osoba CENZURA"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "{{FLG:X}}"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .report()
        .submit("CENZURA", Answer::from("Osoba CENZURA"))
        .await
        .unwrap();

    assert!(response.is_accepted());
    assert_eq!(response.message_text(), "{{FLG:X}}");
}

#[tokio::test]
async fn test_rejection_with_4xx_is_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -340,
            "message": "Answer for question 01 is incorrect",
            "hint": "szukaj dalej",
            "debug": "You sent: 2019"
        })))
        .mount(&server)
        .await;

    let answer = Answer::map_of([("01", "2019")]).unwrap();
    let response = client(&server).report().grade("notes", answer).await.unwrap();

    match response.verdict() {
        Verdict::Rejected(rejection) => {
            assert_eq!(rejection.code, Some(-340));
            assert_eq!(rejection.hint.as_deref(), Some("szukaj dalej"));
            assert_eq!(rejection.sent_answer().as_deref(), Some("2019"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_error_body_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .report()
        .submit("loop", Answer::from("KRAKOW"))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::ServerError(_)));
}
