use course_core::{ApiKey, Coordinates, GpsFix, NameList};
use course_sdk::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CourseClient {
    CourseClient::new(SdkConfig::new(server.uri()).with_api_key(ApiKey::new("test-key").unwrap()))
        .unwrap()
}

// ===== Lookup Tests =====

#[tokio::test]
async fn test_people_string_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/people"))
        .and(body_json(json!({"apikey": "test-key", "query": "BARBARA"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "KRAKOW WARSZAWA"})),
        )
        .mount(&server)
        .await;

    let places = client(&server).lookup().people("BARBARA").await.unwrap();
    assert_eq!(
        places,
        NameList::Names(vec!["KRAKOW".to_string(), "WARSZAWA".to_string()])
    );
}

#[tokio::test]
async fn test_places_restricted_on_4xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/places"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -200, "message": "[**RESTRICTED DATA**]"})),
        )
        .mount(&server)
        .await;

    let people = client(&server).lookup().places("CIECHOCINEK").await.unwrap();
    assert!(people.is_restricted());
}

#[tokio::test]
async fn test_gps_sends_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gps"))
        .and(body_json(json!({"apikey": "test-key", "userID": 28})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 0, "message": {"lat": 53.451974, "lon": 18.759189}})),
        )
        .mount(&server)
        .await;

    let fix = client(&server).lookup().gps(28).await.unwrap();
    assert_eq!(
        fix,
        GpsFix::Located(Coordinates {
            lat: 53.451974,
            lon: 18.759189
        })
    );
}

#[tokio::test]
async fn test_database_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apidb"))
        .and(body_json(json!({
            "task": "database",
            "apikey": "test-key",
            "query": "SELECT id FROM users WHERE username = 'Rafał'"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"reply": [{"id": "28"}], "error": "OK"})),
        )
        .mount(&server)
        .await;

    let reply = client(&server)
        .lookup()
        .database("SELECT id FROM users WHERE username = 'Rafał'")
        .await
        .unwrap();
    assert_eq!(course_core::cell_i64(&reply.rows()[0], "id"), Some(28));
}

#[tokio::test]
async fn test_database_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apidb"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reply": null, "error": "Table 'x' doesn't exist"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).lookup().database("SELECT * FROM x").await.unwrap_err();
    assert!(matches!(err, SdkError::ApiError { .. }));
}

// ===== Transport Failure Tests =====

#[tokio::test]
async fn test_places_server_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/places"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Internal Server Error"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).lookup().places("KRAKOW").await.unwrap_err();
    assert!(matches!(err, SdkError::ServerError(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_people_unauthorized_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/people"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "invalid apikey"})))
        .mount(&server)
        .await;

    let err = client(&server).lookup().people("BARBARA").await.unwrap_err();
    assert!(matches!(err, SdkError::AuthenticationError(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_database_unauthorized_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apidb"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "invalid apikey"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .lookup()
        .database("SELECT id FROM users")
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::AuthenticationError(ref m) if m == "invalid apikey"));
}

#[tokio::test]
async fn test_database_reply_without_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apidb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": [["1"]]})))
        .mount(&server)
        .await;

    let reply = client(&server).lookup().database("SELECT 1").await.unwrap();
    assert_eq!(reply.rows().len(), 1);
}
