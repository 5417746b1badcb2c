use course_core::*;
use serde_json::json;

fn batch() -> QuestionSet {
    QuestionSet::from_value(&json!({
        "01": "Do którego roku przeniósł się Rafał?",
        "02": "Kto wpadł na pomysł?",
        "03": "Gdzie znalazł schronienie?",
    }))
    .unwrap()
}

fn rejection_of(body: &str) -> Rejection {
    match ReportResponse::parse(body).unwrap().verdict() {
        Verdict::Rejected(rejection) => rejection,
        Verdict::Accepted { .. } => panic!("expected rejection"),
    }
}

// ===== Classification Tests =====

#[test]
fn test_free_text_single_question() {
    let classifier = ErrorClassifier::new().unwrap();
    let rejection = rejection_of(
        r#"{"code": -340, "message": "Answer for question 02 is incorrect", "hint": "to nie Rafał", "debug": "You sent: Rafał"}"#,
    );

    match classifier.classify(&rejection, &batch()) {
        FailureClass::SingleQuestion(failure) => {
            assert_eq!(failure.id.as_str(), "02");
            assert_eq!(failure.sent_answer.as_deref(), Some("Rafał"));
            assert_eq!(failure.hint.as_deref(), Some("to nie Rafał"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_two_questions_named_is_ambiguous() {
    let classifier = ErrorClassifier::new().unwrap();
    let rejection = rejection_of(
        r#"{"code": -300, "message": "question 01 or question 3 contradicts the notes"}"#,
    );

    match classifier.classify(&rejection, &batch()) {
        FailureClass::Ambiguous { candidates, .. } => {
            let ids: Vec<&str> = candidates.iter().map(QuestionId::as_str).collect();
            assert_eq!(ids, vec!["01", "03"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_repeated_mention_is_single() {
    let classifier = ErrorClassifier::new().unwrap();
    let rejection = rejection_of(
        r#"{"code": -340, "message": "Question 1: wrong. Check question 01 again"}"#,
    );
    assert_eq!(classifier.classify(&rejection, &batch()).category(), "single_question");
}

#[test]
fn test_format_error_is_general() {
    let classifier = ErrorClassifier::new().unwrap();
    let rejection = rejection_of(r#"{"code": -910, "message": "Invalid answer format"}"#);
    assert_eq!(
        classifier.classify(&rejection, &batch()),
        FailureClass::General {
            message: "Invalid answer format".to_string(),
            hint: None,
            debug: None,
        }
    );
}

#[test]
fn test_keyed_message_ignores_unknown_keys() {
    let classifier = ErrorClassifier::new().unwrap();
    let rejection = rejection_of(
        &json!({"code": -340, "message": {"03": "wrong place", "99": "noise"}}).to_string(),
    );
    match classifier.classify(&rejection, &batch()) {
        FailureClass::Keyed(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].id.as_str(), "03");
            assert_eq!(failures[0].message, "wrong place");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_plural_question_list_is_ambiguous() {
    let classifier = ErrorClassifier::new().unwrap();
    let rejection = rejection_of(
        r#"{"code": -340, "message": "Answers for questions 01 and 03 are incorrect", "debug": "sent 2 wrong answers"}"#,
    );

    match classifier.classify(&rejection, &batch()) {
        FailureClass::Ambiguous {
            candidates, debug, ..
        } => {
            let ids: Vec<&str> = candidates.iter().map(QuestionId::as_str).collect();
            assert_eq!(ids, vec!["01", "03"]);
            assert_eq!(debug.as_deref(), Some("sent 2 wrong answers"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_comma_separated_and_polish_lists() {
    let classifier = ErrorClassifier::new().unwrap();

    let english = rejection_of(
        r#"{"code": -340, "message": "questions 01, 02 and 03 are wrong"}"#,
    );
    match classifier.classify(&english, &batch()) {
        FailureClass::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 3),
        other => panic!("unexpected {:?}", other),
    }

    let polish = rejection_of(r#"{"code": -340, "message": "Błędne odpowiedzi na pytania 2 i 3"}"#);
    match classifier.classify(&polish, &batch()) {
        FailureClass::Ambiguous { candidates, .. } => {
            let ids: Vec<&str> = candidates.iter().map(QuestionId::as_str).collect();
            assert_eq!(ids, vec!["02", "03"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}
