use async_trait::async_trait;
use course_core::*;
use course_workflow::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers `"<question>#<call>"`, remembering the prompt context it saw.
#[derive(Default)]
struct ScriptedReasoner {
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedReasoner {
    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn answer(&self, question: Question<'_>) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((
            question.text.to_string(),
            question.previous_attempts.map(str::to_string),
        ));
        Ok(format!("{}#{}", question.text, calls.len()))
    }
}

/// Replays canned responses; repeats the last one when the script runs out.
struct ScriptedGrader {
    responses: Mutex<VecDeque<Value>>,
    last: Value,
    submitted: Mutex<Vec<Value>>,
}

impl ScriptedGrader {
    fn new(responses: Vec<Value>) -> Self {
        let last = responses.last().cloned().unwrap_or(json!({"code": 0, "message": "OK"}));
        Self {
            responses: Mutex::new(responses.into()),
            last,
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Grader for ScriptedGrader {
    async fn grade(&self, task: &str, answer: Answer) -> Result<ReportResponse> {
        assert_eq!(task, "notes");
        self.submitted.lock().unwrap().push(answer.to_value());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone());
        Ok(serde_json::from_value(next)?)
    }
}

fn questions() -> QuestionSet {
    [("01", "Dokąd się przeniósł?"), ("02", "Kiedy?"), ("03", "Kto pomógł?")]
        .into_iter()
        .collect()
}

fn attempt_loop(
    reasoner: Arc<ScriptedReasoner>,
    grader: Arc<ScriptedGrader>,
    config: AttemptLoopConfig,
) -> AttemptLoop {
    AttemptLoop::new(reasoner, grader, config).unwrap()
}

// ===== Termination Tests =====

#[tokio::test]
async fn test_stops_on_first_accepted_round() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![json!({"code": 0, "message": "{FLG:NOTES}"})]));

    let outcome = attempt_loop(reasoner.clone(), grader.clone(), AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(outcome.accepted);
    assert_eq!(outcome.rounds, 1);
    assert_eq!(grader.submitted().len(), 1);
    assert_eq!(reasoner.calls().len(), 3);
    assert_eq!(
        outcome.states(),
        vec![
            LoopState::Answering { round: 1 },
            LoopState::Submitting { round: 1 },
            LoopState::Success { round: 1 },
        ]
    );
}

#[tokio::test]
async fn test_rounds_are_bounded() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![json!({"code": -340, "message": "Wrong format"})]));

    let outcome = attempt_loop(reasoner, grader.clone(), AttemptLoopConfig::default().with_max_rounds(3))
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(!outcome.accepted);
    assert_eq!(outcome.rounds, 3);
    assert_eq!(grader.submitted().len(), 3);
    assert_eq!(outcome.states().last(), Some(&LoopState::Exhausted { rounds: 3 }));
    assert_eq!(outcome.last_response.unwrap().code, Some(-340));
}

#[tokio::test]
async fn test_missing_code_is_not_success() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![json!({"message": "OK"})]));

    let outcome = attempt_loop(reasoner, grader, AttemptLoopConfig::default().with_max_rounds(2))
        .run("notes", &questions(), "")
        .await
        .unwrap();

    assert!(!outcome.accepted);
    assert_eq!(outcome.rounds, 2);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let loop_ = attempt_loop(
        Arc::new(ScriptedReasoner::default()),
        Arc::new(ScriptedGrader::new(vec![])),
        AttemptLoopConfig::default(),
    );
    assert!(matches!(
        loop_.run("notes", &QuestionSet::new(), "").await,
        Err(CoreError::Validation(_))
    ));
}

// ===== Feedback Routing Tests =====

#[tokio::test]
async fn test_single_question_is_retried_with_feedback() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({
            "code": -340,
            "message": "Answer for question 02 is incorrect",
            "hint": "podaj pełną datę",
            "debug": "You sent: Kiedy?#2"
        }),
        json!({"code": 0, "message": "{FLG:NOTES}"}),
    ]));

    let outcome = attempt_loop(reasoner.clone(), grader.clone(), AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(outcome.accepted);
    assert_eq!(outcome.rounds, 2);

    let calls = reasoner.calls();
    assert_eq!(calls.len(), 4);
    let (text, previous) = &calls[3];
    assert_eq!(text, "Kiedy?");
    let previous = previous.as_deref().unwrap();
    assert!(previous.contains("Wrong answer: Kiedy?#2"));
    assert!(previous.contains("Hint: podaj pełną datę"));

    // Both rounds submit the complete set; only 02 changed.
    let submitted = grader.submitted();
    assert_eq!(submitted[1]["01"], submitted[0]["01"]);
    assert_eq!(submitted[1]["03"], submitted[0]["03"]);
    assert_eq!(submitted[1]["02"], json!("Kiedy?#4"));

    let ledger = &outcome.ledger;
    assert_eq!(ledger.records(&QuestionId::new("02")).len(), 1);
    assert!(ledger.records(&QuestionId::new("01")).is_empty());
}

#[tokio::test]
async fn test_keyed_errors_retry_each_named_question() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({"code": -340, "message": {"01": "zła miejscowość", "03": "złe imię"}}),
        json!({"code": 0, "message": "OK"}),
    ]));

    let outcome = attempt_loop(reasoner.clone(), grader, AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(outcome.accepted);
    let retried: Vec<String> = reasoner.calls()[3..].iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(retried, vec!["Dokąd się przeniósł?", "Kto pomógł?"]);
    let record = &outcome.ledger.records(&QuestionId::new("01"))[0];
    assert_eq!(record.message, "zła miejscowość");
    assert_eq!(record.sent_answer.as_deref(), Some("Dokąd się przeniósł?#1"));
}

#[tokio::test]
async fn test_general_failure_becomes_shared_note() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({"code": -340, "message": "Answers must be strings", "hint": "format"}),
        json!({"code": 0, "message": "OK"}),
    ]));

    let outcome = attempt_loop(reasoner.clone(), grader, AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert_eq!(reasoner.calls().len(), 6);
    assert_eq!(outcome.ledger.shared().len(), 1);
    assert!(outcome.ledger.records(&QuestionId::new("01")).is_empty());
    let context = reasoner.calls()[3].1.clone().unwrap();
    assert!(context.contains("Feedback on the whole answer set"));
    assert!(!context.contains("Wrong answer"));
}

#[tokio::test]
async fn test_general_failure_attached_to_all() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({"code": -340, "message": "Answers must be strings"}),
        json!({"code": 0, "message": "OK"}),
    ]));
    let config = AttemptLoopConfig::default().with_general_policy(GeneralFailurePolicy::AttachToAll);

    let outcome = attempt_loop(reasoner, grader, config)
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(outcome.ledger.shared().is_empty());
    for id in ["01", "02", "03"] {
        assert_eq!(outcome.ledger.records(&QuestionId::new(id)).len(), 1);
    }
}

#[tokio::test]
async fn test_ambiguous_failure_retries_candidates_only() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({"code": -340, "message": "question 01 or question 03 is wrong"}),
        json!({"code": 0, "message": "OK"}),
    ]));

    let outcome = attempt_loop(reasoner.clone(), grader, AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(outcome.accepted);
    assert_eq!(reasoner.calls().len(), 5);
    assert!(outcome.ledger.records(&QuestionId::new("02")).is_empty());
    assert_eq!(outcome.ledger.records(&QuestionId::new("03")).len(), 1);
}

#[tokio::test]
async fn test_general_failure_keeps_server_debug() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({
            "code": -340,
            "message": "Wrong answers",
            "hint": "h",
            "debug": "You sent: Kraków for the year"
        }),
        json!({"code": 0, "message": "OK"}),
    ]));

    let outcome = attempt_loop(reasoner.clone(), grader, AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    assert!(outcome.accepted);
    let context = reasoner.calls()[3].1.clone().unwrap();
    assert_eq!(
        context,
        "Feedback on the whole answer set:\nRound 1:\n- Error: Wrong answers\n- Hint: h\n- Debug: You sent: Kraków for the year"
    );
}

#[tokio::test]
async fn test_plural_question_list_retries_named_questions() {
    let reasoner = Arc::new(ScriptedReasoner::default());
    let grader = Arc::new(ScriptedGrader::new(vec![
        json!({
            "code": -340,
            "message": "Answers for questions 01 and 03 are incorrect",
            "debug": "2 of 3 wrong"
        }),
        json!({"code": 0, "message": "OK"}),
    ]));

    let outcome = attempt_loop(reasoner.clone(), grader, AttemptLoopConfig::default())
        .run("notes", &questions(), "notatnik")
        .await
        .unwrap();

    let retried: Vec<String> = reasoner.calls()[3..].iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(retried, vec!["Dokąd się przeniósł?", "Kto pomógł?"]);
    let record = &outcome.ledger.records(&QuestionId::new("03"))[0];
    assert_eq!(record.debug.as_deref(), Some("2 of 3 wrong"));
    assert_eq!(record.sent_answer.as_deref(), Some("Kto pomógł?#3"));
}
