//! Retry-with-feedback loop for batch question tasks.
//!
//! ```text
//! Answering(n) -> Submitting(n) -> Success(n)
//!                              \-> Retry(n) -> Answering(n + 1) ... -> Exhausted
//! ```
//!
//! Every round submits the full answer set. After a rejection only the
//! questions the server's feedback points at are answered again, with their
//! previous answers and hints added to the prompt.

use chrono::{DateTime, Utc};
use course_core::{
    AnswerSheet, AttemptLedger, AttemptRecord, CoreError, ErrorClassifier, FailureClass, Grader,
    Question, QuestionFailure, QuestionId, QuestionSet, Reasoner, ReportResponse, Result, Verdict,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// What to do with feedback that names no question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralFailurePolicy {
    /// Keep it as one batch-level note shown to every question.
    #[default]
    SharedNote,
    /// Record it against every question, each with its own previous answer.
    AttachToAll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptLoopConfig {
    pub max_rounds: u32,
    pub general_policy: GeneralFailurePolicy,
}

impl Default for AttemptLoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            general_policy: GeneralFailurePolicy::default(),
        }
    }
}

impl AttemptLoopConfig {
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_general_policy(mut self, policy: GeneralFailurePolicy) -> Self {
        self.general_policy = policy;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoopState {
    Answering { round: u32 },
    Submitting { round: u32 },
    Retry { round: u32 },
    Success { round: u32 },
    Exhausted { rounds: u32 },
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Answering { round } => write!(f, "answering (round {})", round),
            LoopState::Submitting { round } => write!(f, "submitting (round {})", round),
            LoopState::Retry { round } => write!(f, "retry after round {}", round),
            LoopState::Success { round } => write!(f, "success in round {}", round),
            LoopState::Exhausted { rounds } => write!(f, "exhausted after {} rounds", rounds),
        }
    }
}

/// One state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: LoopState,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub accepted: bool,
    /// Number of submissions made.
    pub rounds: u32,
    pub answers: AnswerSheet,
    pub last_response: Option<ReportResponse>,
    pub ledger: AttemptLedger,
    pub trace: Vec<Transition>,
}

impl AttemptOutcome {
    pub fn states(&self) -> Vec<LoopState> {
        self.trace.iter().map(|t| t.state).collect()
    }
}

pub struct AttemptLoop {
    reasoner: Arc<dyn Reasoner>,
    grader: Arc<dyn Grader>,
    classifier: ErrorClassifier,
    config: AttemptLoopConfig,
}

impl AttemptLoop {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        grader: Arc<dyn Grader>,
        config: AttemptLoopConfig,
    ) -> Result<Self> {
        Ok(Self {
            reasoner,
            grader,
            classifier: ErrorClassifier::new()?,
            config,
        })
    }

    pub fn config(&self) -> &AttemptLoopConfig {
        &self.config
    }

    /// Answer `questions` against `context` and submit them as `task` until
    /// the server accepts or the round bound is reached. A run that ends
    /// without acceptance is still `Ok`; check [`AttemptOutcome::accepted`].
    pub async fn run(
        &self,
        task: &str,
        questions: &QuestionSet,
        context: &str,
    ) -> Result<AttemptOutcome> {
        if questions.is_empty() {
            return Err(CoreError::Validation("no questions to answer".to_string()));
        }
        if self.config.max_rounds == 0 {
            return Err(CoreError::Configuration(
                "max_rounds must be at least 1".to_string(),
            ));
        }

        let mut answers = AnswerSheet::new();
        let mut ledger = AttemptLedger::new();
        let mut trace = Vec::new();
        let mut last_response = None;
        let mut pending: Vec<QuestionId> = questions.ids().cloned().collect();

        for round in 1..=self.config.max_rounds {
            self.enter(task, &mut trace, LoopState::Answering { round });
            for id in &pending {
                let Some(text) = questions.get(id) else {
                    continue;
                };
                let previous = ledger.context_for(id);
                let answer = self
                    .reasoner
                    .answer(Question {
                        text,
                        context,
                        previous_attempts: previous.as_deref(),
                    })
                    .await?;
                debug!(question = %id, answer = %answer, "Answered");
                answers.set(id.clone(), answer);
            }

            self.enter(task, &mut trace, LoopState::Submitting { round });
            let response = self.grader.grade(task, answers.to_answer()).await?;

            match response.verdict() {
                Verdict::Accepted { message } => {
                    info!(task, round, message = %message, "Answers accepted");
                    self.enter(task, &mut trace, LoopState::Success { round });
                    return Ok(AttemptOutcome {
                        accepted: true,
                        rounds: round,
                        answers,
                        last_response: Some(response),
                        ledger,
                        trace,
                    });
                }
                Verdict::Rejected(rejection) => {
                    let class = self.classifier.classify(&rejection, questions);
                    warn!(
                        task,
                        round,
                        code = ?rejection.code,
                        category = class.category(),
                        message = %rejection.message,
                        "Answers rejected"
                    );
                    pending = self.absorb(round, class, questions, &answers, &mut ledger);
                    last_response = Some(response);
                    if round < self.config.max_rounds {
                        self.enter(task, &mut trace, LoopState::Retry { round });
                    }
                }
            }
        }

        let rounds = self.config.max_rounds;
        self.enter(task, &mut trace, LoopState::Exhausted { rounds });
        Ok(AttemptOutcome {
            accepted: false,
            rounds,
            answers,
            last_response,
            ledger,
            trace,
        })
    }

    /// Record the feedback of a rejected round and return the questions to re-answer.
    fn absorb(
        &self,
        round: u32,
        class: FailureClass,
        questions: &QuestionSet,
        answers: &AnswerSheet,
        ledger: &mut AttemptLedger,
    ) -> Vec<QuestionId> {
        let current = |id: &QuestionId| answers.get(id).map(str::to_string);

        match class {
            FailureClass::Keyed(failures) => failures
                .into_iter()
                .map(|failure| Self::record_failure(round, failure, answers, ledger))
                .collect(),
            FailureClass::SingleQuestion(failure) => {
                vec![Self::record_failure(round, failure, answers, ledger)]
            }
            FailureClass::Ambiguous {
                candidates,
                message,
                hint,
                debug,
            } => {
                for id in &candidates {
                    ledger.record(
                        id.clone(),
                        AttemptRecord::new(round, message.clone())
                            .with_sent_answer(current(id))
                            .with_hint(hint.clone())
                            .with_debug(debug.clone()),
                    );
                }
                candidates
            }
            FailureClass::General {
                message,
                hint,
                debug,
            } => {
                match self.config.general_policy {
                    GeneralFailurePolicy::SharedNote => {
                        ledger.record_shared(
                            AttemptRecord::new(round, message)
                                .with_hint(hint)
                                .with_debug(debug),
                        );
                    }
                    GeneralFailurePolicy::AttachToAll => {
                        for id in questions.ids() {
                            ledger.record(
                                id.clone(),
                                AttemptRecord::new(round, message.clone())
                                    .with_sent_answer(current(id))
                                    .with_hint(hint.clone())
                                    .with_debug(debug.clone()),
                            );
                        }
                    }
                }
                questions.ids().cloned().collect()
            }
        }
    }

    fn record_failure(
        round: u32,
        failure: QuestionFailure,
        answers: &AnswerSheet,
        ledger: &mut AttemptLedger,
    ) -> QuestionId {
        let sent = failure
            .sent_answer
            .or_else(|| answers.get(&failure.id).map(str::to_string));
        ledger.record(
            failure.id.clone(),
            AttemptRecord::new(round, failure.message)
                .with_sent_answer(sent)
                .with_hint(failure.hint),
        );
        failure.id
    }

    fn enter(&self, task: &str, trace: &mut Vec<Transition>, state: LoopState) {
        info!(task, state = %state, "Attempt loop transition");
        trace.push(Transition {
            state,
            at: Utc::now(),
        });
    }
}
